/// Business logic layer for board-service
///
/// - `PostService`: validated CRUD over the post store
/// - `BoardService`: command interpretation, chart assembly and post management
pub mod board;
pub mod posts;

pub use board::{BoardService, ChartEnvelope, ChartOutcome, ManageEnvelope, ManageOutcome};
pub use posts::PostService;
