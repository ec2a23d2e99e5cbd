//! Command registry and dispatcher.
//!
//! Every command has a name (plus optional synonyms) and a compact numeric
//! code. Both resolve through the static [`CommandRegistry`] to the same
//! [`CommandSpec`], and from there the [`Dispatcher`] validates the
//! arguments and runs the command against its owned session.

mod dispatcher;
mod help;
mod registry;
mod shared;
mod value;

/// Result of a successful dispatch.
pub use dispatcher::CommandOutput;
/// Single-session command dispatcher.
pub use dispatcher::Dispatcher;
/// Render the full help text or one command's usage.
pub use help::{render_command, render_help};
/// Static command table and its lookup structure.
pub use registry::{ArgKind, ArgSpec, CommandId, CommandRegistry, CommandSpec};
/// Dispatcher behind a mutex, for multi-threaded hosts.
pub use shared::{SharedDispatcher, WeakDispatcher};
/// Host values passed to the dispatcher.
pub use value::{Token, Value};
