/*!
Session layer for driving a Groundwork installer backend over its bus
protocol.

The crate keeps one live connection per backend service, translates
between the typed wire format and plain values, subscribes to change
notifications, and re-dispatches derived screen-facing state without
duplicate work:

- [registry::ConnectionRegistry] — one connection per service, with an
  explicit reuse/replace contract;
- [proxy::RemoteObject] — property get/set and method invocation against
  a remote object;
- [task::TaskRunner] — start/result/finish driving of long-running
  backend tasks;
- [services] — typed clients for the individual services, each keeping
  its derived-state slices current from change notifications;
- [state] — the dispatcher, the actions and the reducer the UI layer
  consumes.

# Examples

```
use groundwork_client::session::Session;
use groundwork_client::state::State;

async fn run() {
    let (mut session, mut actions) = Session::new();
    session.init("/run/groundwork/bus.sock").await.unwrap();

    let mut state = State::default();

    use futures::StreamExt;
    while let Some(action) = actions.next().await {
        state.apply(action);
    }
}
```
*/

pub mod connection;
pub mod crypt;
pub mod journal;
pub mod proxy;
pub mod registry;
pub mod services;
pub mod session;
pub mod state;
pub mod task;

pub use groundwork_rpc::{Error, Result};
