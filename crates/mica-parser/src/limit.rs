use std::fmt;

/// A LimitTracker enforces a particular limit within the parser. It keeps
/// track of utilization so that we can report how close to a limit we
/// approached over the lifetime of the tracker.
///
/// ```rust
/// use mica_parser::Parser;
///
/// let source = "
/// int main() {
///     return 2 * (3 + 4);
/// }
/// ";
/// let parser = Parser::new(source).recursion_limit(64);
/// let syntax = parser.parse();
/// let usage = syntax.recursion_limit();
/// // `limit` reports the limit we set, `high` is the high-water mark of
/// // recursion usage over the parse.
/// assert_eq!(usage.limit, 64);
/// assert!(usage.high < usage.limit);
/// assert!(syntax.ok());
/// ```
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct LimitTracker {
    current: usize,
    /// High water mark for this limit.
    pub high: usize,
    /// Limit.
    pub limit: usize,
}

impl LimitTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            current: 0,
            high: 0,
            limit,
        }
    }

    /// Consume one unit of the limit, reporting whether the limit is now
    /// exceeded.
    pub fn check_and_increment(&mut self) -> bool {
        self.current += 1;
        if self.current > self.high {
            self.high = self.current;
        }
        self.current > self.limit
    }

    /// Release one unit of the limit, for limits tracking a depth rather
    /// than a running total.
    pub fn decrement(&mut self) {
        self.current -= 1;
    }
}

impl fmt::Debug for LimitTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limit: {}, high: {}", self.limit, self.high)
    }
}
