//! Identity of a logical thread of work.

use std::fmt;
use std::sync::Arc;
use std::thread::ThreadId;

/// Key a context is bound under in the factory.
///
/// Inside a tokio task the key is the task ID, so tasks multiplexed on one
/// worker thread each get their own context. Outside a task it is the OS
/// thread ID. Schedulers with their own notion of identity use
/// [`ThreadKey::named`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThreadKey {
    /// A tokio task.
    Task(tokio::task::Id),
    /// An OS thread outside any task.
    Thread(ThreadId),
    /// An explicitly named unit of work.
    Named(Arc<str>),
}

impl ThreadKey {
    /// Key of the code calling this.
    #[must_use]
    pub fn current() -> Self {
        match tokio::task::try_id() {
            Some(id) => Self::Task(id),
            None => Self::current_thread(),
        }
    }

    /// Key of the current OS thread, even inside a task.
    #[must_use]
    pub fn current_thread() -> Self {
        Self::Thread(std::thread::current().id())
    }

    /// An explicit key.
    #[must_use]
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::Named(name.into())
    }

    /// Whether this key identifies a tokio task.
    #[must_use]
    pub fn is_task(&self) -> bool {
        matches!(self, Self::Task(_))
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(id) => write!(f, "task:{id}"),
            Self::Thread(id) => {
                let current = std::thread::current();
                match current.name() {
                    Some(name) if current.id() == *id => write!(f, "thread:{name}"),
                    _ => write!(f, "thread:{id:?}"),
                }
            },
            Self::Named(name) => write!(f, "named:{name}"),
        }
    }
}
