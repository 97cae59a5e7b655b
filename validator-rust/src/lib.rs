//! Shared data model, error taxonomy and privacy auditing for anonymized travel records.
//!
//! The runtime crate transforms a [`Dataframe`](base::Dataframe) stage by stage.
//! This crate holds everything those stages agree on: the column and cell types, the
//! privacy definition, the partition/bucket model, and the auditor that decides whether
//! Level-2 generalization is necessary.

// `error_chain!` can recurse deeply
#![recursion_limit = "1024"]
#[macro_use]
extern crate error_chain;

#[doc(hidden)]
pub mod errors {
    // Create the Error, ErrorKind, ResultExt, and Result types
    error_chain! {
        foreign_links {
            Io(::std::io::Error);
            Csv(::csv::Error);
            Json(::serde_json::Error);
        }

        errors {
            MalformedDate(value: String) {
                description("malformed date")
                display("value could not be parsed as a date: {:?}", value)
            }
            MalformedValue(column: String, row: usize, value: String) {
                description("malformed value")
                display("column {:?}, row {}: value could not be parsed: {:?}", column, row, value)
            }
            DivergenceUndefined(category: String) {
                description("divergence undefined")
                display("category {:?} is present in the original data but absent after anonymization", category)
            }
            UnsatisfiableGroup(group: String) {
                description("unsatisfiable group")
                display("privacy thresholds could not be met: {}", group)
            }
        }
    }
}

#[doc(hidden)]
pub use errors::*;

pub mod base;
pub mod utilities;

pub use crate::utilities::privacy::{audit, Audit};

// define the useful macro for building indexmaps of category counts in tests and examples
#[macro_export]
#[doc(hidden)]
macro_rules! counts {
    ($( $key: expr => $val: expr ),*) => {{
         #[allow(unused_mut)]
         let mut map = ::indexmap::IndexMap::<String, usize>::new();
         $( map.insert($key.to_string(), $val); )*
         map
    }}
}
