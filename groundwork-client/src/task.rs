use std::sync::Arc;

use bson::Bson;
use futures::StreamExt;
use log::debug;

use groundwork_rpc::Error;

use crate::{
    connection::{Connection, SignalStream},
    proxy::RemoteObject,
};

/// Interface implemented by the task objects returned from `...WithTask`
/// methods
pub const TASK_INTERFACE: &str = "org.groundwork.Installer.Task";

/// Per-invocation success dispatch record. The backend is known to emit
/// `Succeeded` twice for one task; only the first transition fetches the
/// result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    NotDispatched,
    Dispatched,
}

/// Proxy around one started long-running task object.
///
/// One runner per logical operation. Starting a second task of the same
/// kind while one is outstanding is not guarded here; callers must not
/// race themselves
pub struct TaskRunner {
    object: RemoteObject,
    signals: SignalStream,
    state: DispatchState,
    result: Option<Bson>,
}

impl TaskRunner {
    /// Bind to the task at `task_path`, wait for the object to become
    /// ready and start it. A `Start` rejection is the failure path
    pub async fn start(connection: Arc<Connection>, task_path: &str) -> crate::Result<TaskRunner> {
        let object = RemoteObject::new(connection.clone(), task_path, TASK_INTERFACE);

        // Subscribe before starting so no completion signal can be missed
        let signals = connection.subscribe().await;

        // Readiness probe: the property table is served once the task
        // object is exported
        let steps: i64 = object.get_typed("Steps").await?;
        debug!("Task {task_path} ready, {steps} steps");

        object.call("Start", vec![]).await?;

        Ok(Self {
            object,
            signals,
            state: DispatchState::NotDispatched,
            result: None,
        })
    }

    /// Success dispatch record of this invocation
    pub fn dispatch_state(&self) -> DispatchState {
        self.state
    }

    /// Drive the task to completion.
    ///
    /// `Succeeded` fetches the result exactly once per invocation.
    /// `Stopped` acknowledges the task with `Finish`, whose rejection is
    /// the failure path. There is no timeout anywhere in this layer: a
    /// task that never stops hangs the caller
    pub async fn wait(mut self) -> crate::Result<Bson> {
        while let Some(signal) = self.signals.next().await {
            if signal.path.as_str() != self.object.path() {
                continue;
            }

            match signal.member.as_str() {
                "Succeeded" => {
                    if self.state == DispatchState::Dispatched {
                        debug!("Duplicate `Succeeded` for task {}", self.object.path());
                        continue;
                    }

                    self.state = DispatchState::Dispatched;
                    self.result = Some(self.object.call("GetResult", vec![]).await?);
                }
                "Stopped" => {
                    self.object.call("Finish", vec![]).await?;

                    return self.result.take().ok_or(Error::TaskStopped);
                }
                other => debug!("Unhandled task signal {other}"),
            }
        }

        Err(Error::PeerDisconnected)
    }
}

/// Call a `...WithTask` method on `object` and run the resulting task to
/// completion
pub async fn run_task(object: &RemoteObject, member: &str) -> crate::Result<Bson> {
    let task_path: String = object.call_typed(member, vec![]).await?;

    let runner = TaskRunner::start(object.connection().clone(), &task_path).await?;
    runner.wait().await
}
