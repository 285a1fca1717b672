//! Prelude module - commonly used test utilities.
//!
//! Use `use keystone_test::prelude::*;` to import all essential types.

pub use crate::{MockUserFacade, RecordingMessageFacade};

pub use crate::{CounterTool, CounterToolFactory, FailingReleaseToolFactory};

pub use crate::{
    init_test_tracing, test_config, test_factory, test_factory_with_clock, test_factory_with_tools,
};
