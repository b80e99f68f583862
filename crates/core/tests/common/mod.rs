/// DSL macro for building test schedules.
///
/// Produces a `schedcop_core::Schedule`.
///
/// # Syntax
///
/// ```ignore
/// schedule![w(1, A), r(2, A), c(1), c(2)]
/// ```
///
/// - `r(tx, item)` -> `Operation::read(tx, 'item')`
/// - `w(tx, item)` -> `Operation::write(tx, 'item')`
/// - `c(tx)`       -> `Operation::commit(tx)`
///
/// Build a single Operation.
#[macro_export]
macro_rules! op {
    (r($tx:expr, $item:ident)) => {
        schedcop_core::Operation::read($tx, $crate::item_char!($item))
    };
    (w($tx:expr, $item:ident)) => {
        schedcop_core::Operation::write($tx, $crate::item_char!($item))
    };
    (c($tx:expr)) => {
        schedcop_core::Operation::commit($tx)
    };
}

/// Turn a one-letter identifier into its `char`.
#[macro_export]
macro_rules! item_char {
    ($item:ident) => {{
        let name = stringify!($item);
        assert_eq!(name.len(), 1, "data items are single letters");
        name.as_bytes()[0] as char
    }};
}

/// Build a full schedule from operations.
#[macro_export]
macro_rules! schedule {
    ($($kind:ident($($args:tt)*)),* $(,)?) => {
        schedcop_core::Schedule::new(vec![
            $($crate::op!($kind($($args)*))),*
        ])
    };
}

/// Shorthand for a list of transaction ids.
#[macro_export]
macro_rules! txs {
    ($($id:expr),* $(,)?) => {
        vec![$(schedcop_core::TransactionId($id)),*]
    };
}
