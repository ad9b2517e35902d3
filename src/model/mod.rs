pub mod matrix;
pub mod normalize;
pub mod plate;
pub mod replicat;
pub mod screen;
pub mod setup;
pub mod table;

pub use matrix::WellMatrix;
pub use normalize::NormalizationMethod;
pub use plate::{Controls, Plate};
pub use replicat::{MatrixKey, MatrixStage, Replicat, SummaryMethod};
pub use screen::Screen;
pub use setup::PlateSetup;
pub use table::{DataKind, RawTable};
