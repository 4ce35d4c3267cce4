pub mod formatter;

pub use formatter::{
    format_bonus, format_ledger, format_result_detail, format_result_table, format_term,
    format_term_json, should_use_colors,
};
