//! Runtime abstraction layer for async operations
//!
//! Tile fetches and server probes are the only work that leaves the render
//! thread. They are spawned through [`AsyncSpawner`] so the engine does not care
//! which executor drives them.

use futures::future::BoxFuture;
use std::sync::Arc;

/// A trait for spawning fire-and-forget async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>);
}

/// Shared handle to a spawner.
pub type SharedSpawner = Arc<dyn AsyncSpawner>;

/// Default spawner implementations
pub mod spawners {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::runtime::Handle;

        /// Tokio-based async spawner bound to a runtime handle
        #[derive(Debug, Clone)]
        pub struct TokioSpawner {
            handle: Handle,
        }

        impl TokioSpawner {
            pub fn new(handle: Handle) -> Self {
                Self { handle }
            }

            /// Spawner for the runtime the caller is running inside.
            /// Returns None outside of a tokio context.
            pub fn current() -> Option<Self> {
                Handle::try_current().ok().map(Self::new)
            }
        }

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(&self, future: BoxFuture<'static, ()>) {
                self.handle.spawn(future);
            }
        }
    }

    /// Runs every future to completion on the calling thread. Useful for tests
    /// and tools that want fetches resolved before `spawn` returns.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct BlockingSpawner;

    impl AsyncSpawner for BlockingSpawner {
        fn spawn_boxed(&self, future: BoxFuture<'static, ()>) {
            futures::executor::block_on(future);
        }
    }
}

/// The tokio spawner for the current context, if there is one.
#[cfg(feature = "tokio-runtime")]
pub fn current_spawner() -> Option<SharedSpawner> {
    spawners::tokio_impl::TokioSpawner::current().map(|s| Arc::new(s) as SharedSpawner)
}
