pub mod libs;

pub use libs::alignment::{Alignment, MoleculeType};
pub use libs::error::{DivError, MergeConsistencyError};
pub use libs::extended::{ColumnMap, ExtendedAlignment, Origin};
pub use libs::io::{reader, writer};
