use crate::error::ReducerError;

/// An immutable description of an intended state change.
///
/// `kind` is the discriminator reducers and logs key off. For enum actions
/// it is usually just the variant name.
pub trait Action: Clone + Send + Sync + 'static {
    fn kind(&self) -> &str;
}

impl Action for &'static str {
    fn kind(&self) -> &str {
        self
    }
}

impl Action for String {
    fn kind(&self) -> &str {
        self.as_str()
    }
}

/// Outcome of applying one action: the next state and an optional error.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction<S> {
    pub state: S,
    pub error: Option<ReducerError>,
}

impl<S> Reduction<S> {
    /// A successful reduction.
    pub fn ok(state: S) -> Self {
        Self { state, error: None }
    }

    /// A reduction that reports `error` but still carries `state`.
    pub fn failed(state: S, error: impl Into<String>) -> Self {
        Self {
            state,
            error: Some(ReducerError::new(error)),
        }
    }

    /// Whether the reducer reported no error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl<S> From<S> for Reduction<S> {
    fn from(state: S) -> Self {
        Self::ok(state)
    }
}

/// A pure transition function from `(state, action)` to the next state.
///
/// The store runs at most one reduction at a time, so implementations
/// must not lock anything themselves.
///
/// # Examples
///
/// ```
/// use tindux::{Reducer, Reduction};
///
/// fn add(state: &i64, action: &&'static str) -> Reduction<i64> {
///     match *action {
///         "INC" => Reduction::ok(state + 1),
///         _ => Reduction::ok(*state),
///     }
/// }
///
/// assert_eq!(Reducer::<i64, &str>::reduce(&add, &1, &"INC").state, 2);
/// ```
pub trait Reducer<S, A>: Send + Sync + 'static {
    fn reduce(&self, state: &S, action: &A) -> Reduction<S>;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, &A) -> Reduction<S> + Send + Sync + 'static,
{
    fn reduce(&self, state: &S, action: &A) -> Reduction<S> {
        self(state, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Step {
        Up,
        Down,
        Explode,
    }

    impl Action for Step {
        fn kind(&self) -> &str {
            match self {
                Step::Up => "UP",
                Step::Down => "DOWN",
                Step::Explode => "EXPLODE",
            }
        }
    }

    struct Stepper {
        size: i32,
    }

    impl Reducer<i32, Step> for Stepper {
        fn reduce(&self, state: &i32, action: &Step) -> Reduction<i32> {
            match action {
                Step::Up => Reduction::ok(state + self.size),
                Step::Down => Reduction::ok(state - self.size),
                Step::Explode => Reduction::failed(*state, "boom"),
            }
        }
    }

    #[test]
    fn struct_reducer() {
        let stepper = Stepper { size: 3 };
        assert_eq!(stepper.reduce(&0, &Step::Up).state, 3);
        assert_eq!(stepper.reduce(&0, &Step::Down).state, -3);
    }

    #[test]
    fn closure_reducer() {
        let double = |state: &i32, _: &Step| Reduction::ok(state * 2);
        assert_eq!(
            Reducer::<i32, Step>::reduce(&double, &21, &Step::Up),
            Reduction::ok(42)
        );
    }

    #[test]
    fn failed_reduction_keeps_state() {
        let reduction = Stepper { size: 1 }.reduce(&7, &Step::Explode);
        assert!(!reduction.is_ok());
        assert_eq!(reduction.state, 7);
        assert_eq!(reduction.error.unwrap().message(), "boom");
    }

    #[test]
    fn action_kind() {
        assert_eq!(Step::Explode.kind(), "EXPLODE");
        assert_eq!("INC".kind(), "INC");
        assert_eq!(String::from("DEC").kind(), "DEC");
    }
}
