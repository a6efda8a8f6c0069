// Action chain - named actions run in one synchronous, fail-fast build pass
//
// Registration and build share a single reader/writer lock; the build loop
// works on a snapshot so actions never run under the lock.

pub mod types;
pub mod traits;
pub mod registry;
pub mod builder;


pub use types::{
    invoked_key, option, Aborted, ActionEntry, ActionFn, ActionOption, BuildOutcome, BuildReport,
    ExecutionOrder, StatusPolicy,
};
pub use traits::ActionChain;
pub use registry::Registry;
