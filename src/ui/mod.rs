pub mod icons;
pub mod output;
pub mod progress;
pub mod progress_message;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, finish_summary, header, info, section, status, success, timing, warn};
pub use progress::BuildProgress;
pub use progress_message::{ProgressMessage, ProgressPhase};
pub use table::{db_table, graph_table, linker_table, TableBuilder};
pub use theme::{theme, Theme};
