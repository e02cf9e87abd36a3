//! Mounting: following the session scope for the lifetime of a handle

use studysync_session::{Identity, SessionScope};
use tokio::task::JoinHandle;

/// Something that re-subscribes when the bound identity changes
pub trait Rebind: Send + Sync + 'static {
    /// Tear down and re-open for `identity` (`None` unbinds)
    fn rebind(&self, identity: Option<&Identity>);
}

/// Live mount of a synchronizer
///
/// Dropping or [`unmount`](Self::unmount)ing stops every background task and
/// unbinds the synchronizer.
#[must_use = "dropping a MountHandle unmounts the synchronizer"]
pub struct MountHandle {
    tasks: Vec<JoinHandle<()>>,
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl std::fmt::Debug for MountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountHandle")
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl MountHandle {
    /// Handle over `tasks`, running `teardown` after they are stopped
    pub fn new(tasks: Vec<JoinHandle<()>>, teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            tasks,
            teardown: Some(Box::new(teardown)),
        }
    }

    /// One handle over several; dropping it unmounts them in order
    pub fn group(handles: Vec<MountHandle>) -> Self {
        Self::new(Vec::new(), move || drop(handles))
    }

    /// Add another background task
    #[must_use]
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Stop now
    pub fn unmount(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Bind `target` to the current identity and keep following `scope`
pub fn follow_scope<R>(scope: &SessionScope, target: R) -> MountHandle
where
    R: Rebind + Clone,
{
    let mut feed = scope.subscribe();
    let current = feed.borrow_and_update().clone();
    target.rebind(current.as_ref());

    let follower = target.clone();
    let task = tokio::spawn(async move {
        while feed.changed().await.is_ok() {
            let next = feed.borrow_and_update().clone();
            follower.rebind(next.as_ref());
        }
    });
    MountHandle::new(vec![task], move || target.rebind(None))
}
