//! Required-parameter checks run before a handler is invoked.

use crate::extract::Args;

/// Returns the first index in `required` whose argument is empty.
///
/// Indices past the end of `args` count as absent.
pub fn first_empty(args: &Args, required: &[usize]) -> Option<usize> {
    required
        .iter()
        .copied()
        .find(|&index| args.get(index).map_or(true, |arg| arg.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Arg;
    use serde_json::json;

    fn args() -> Args {
        Args::new(vec![
            Arg::Text("1".into()),
            Arg::Absent,
            Arg::Text(String::new()),
            Arg::Json(json!(null)),
        ])
    }

    #[test]
    fn reports_first_failing_index_in_required_order() {
        assert_eq!(first_empty(&args(), &[0, 2, 1]), Some(2));
        assert_eq!(first_empty(&args(), &[3]), Some(3));
    }

    #[test]
    fn passes_when_all_present() {
        assert_eq!(first_empty(&args(), &[0]), None);
        assert_eq!(first_empty(&args(), &[]), None);
    }

    #[test]
    fn out_of_range_is_absent() {
        assert_eq!(first_empty(&Args::default(), &[0]), Some(0));
    }
}
