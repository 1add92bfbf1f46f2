//! An embeddable single-line terminal editor: history, reverse-incremental
//! search, tab completion, and both a blocking and a cooperative
//! (tokio-driven) facade over the same edit state machine.
//!
//! ```no_run
//! use james_readline::Editor;
//!
//! let mut editor = Editor::new(100)?;
//! editor.parse_and_bind("ctrl-g: line-clear");
//! loop {
//!     match editor.readline("> ") {
//!         Ok(line) => println!("got: {line}"),
//!         Err(james_readline::ReadlineError::Eof) => break,
//!         Err(james_readline::ReadlineError::Interrupted) => continue,
//!         Err(e) => return Err(e.into()),
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod bindings;
mod buffer;
mod completion;
mod editor;
mod error;
mod history;
mod key;
mod key_reader;
mod raw;
mod search;
mod terminal;

pub use bindings::{KeyBindings, Operation};
pub use completion::{AsyncCompleter, Completer};
pub use editor::{AsyncEditor, Editor, EditorCore};
pub use error::{ReadlineError, Result};
pub use history::History;
pub use key::SemanticKey;
pub use key_reader::{AsyncKeyReader, InterruptFlag, KeyReader, TokioKeyReader};
pub use raw::{default_source, DefaultRawSource, RawModeGuard, RawSource, EDITOR_ACTIVE};
pub use search::{Direction, ReverseSearchState};
