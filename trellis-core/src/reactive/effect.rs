//! Effect Registrations
//!
//! An effect is a side-effecting computation a view registers during render.
//! After the render, the scheduler compares the registration's dependency
//! list with the list captured at its previous execution and decides whether
//! to run it.
//!
//! # Dependency Lists
//!
//! - `Deps::Always`: run after every render.
//! - `Deps::Once`: run after the first render only. An empty list behaves
//!   the same way, since an empty list never differs from its snapshot.
//! - `Deps::List`: run when any positional element differs from the
//!   snapshot, or when the length changed.
//!
//! # Shallow Comparison
//!
//! Elements compare shallowly. Scalars and strings compare by value, floats
//! by bit pattern, and shared values (`Rc<T>`) by identity. Allocating a new
//! `Rc` on every render therefore re-runs the effect every render even when
//! the contents are equal; keep the `Rc` in state to avoid that.
//!
//! # Cleanup
//!
//! An effect body may return a [`Cleanup`]. It runs right before the next
//! execution of the same registration, or at teardown. A `Cleanup` is
//! consumed when run, so it can run at most once.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// Identifier of an effect registration.
///
/// This is the hook slot the effect occupies in its view's render function,
/// so it stays the same across renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(usize);

impl EffectId {
    /// Create an ID for the given hook slot.
    pub fn new(slot: usize) -> Self {
        Self(slot)
    }

    /// Get the hook slot.
    pub fn slot(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// A single dependency value.
#[derive(Clone)]
pub enum Dep {
    /// Absent value (`()` or `None`).
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(Rc<str>),
    /// A shared value compared by identity.
    Ref(Rc<dyn Any>),
}

impl Dep {
    /// Depend on the identity of a shared value.
    pub fn by_ref<T: Any>(value: &Rc<T>) -> Self {
        Dep::Ref(Rc::clone(value) as Rc<dyn Any>)
    }

    /// Shallow same-value comparison.
    pub fn same(&self, other: &Dep) -> bool {
        match (self, other) {
            (Dep::Null, Dep::Null) => true,
            (Dep::Bool(a), Dep::Bool(b)) => a == b,
            (Dep::Int(a), Dep::Int(b)) => a == b,
            (Dep::UInt(a), Dep::UInt(b)) => a == b,
            (Dep::Float(a), Dep::Float(b)) => a.to_bits() == b.to_bits(),
            (Dep::Str(a), Dep::Str(b)) => a == b,
            (Dep::Ref(a), Dep::Ref(b)) => {
                std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
            }
            _ => false,
        }
    }
}

impl PartialEq for Dep {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dep::Null => f.write_str("Null"),
            Dep::Bool(v) => write!(f, "Bool({v})"),
            Dep::Int(v) => write!(f, "Int({v})"),
            Dep::UInt(v) => write!(f, "UInt({v})"),
            Dep::Float(v) => write!(f, "Float({v})"),
            Dep::Str(v) => write!(f, "Str({v:?})"),
            Dep::Ref(v) => write!(f, "Ref({:p})", Rc::as_ptr(v) as *const ()),
        }
    }
}

impl From<()> for Dep {
    fn from(_: ()) -> Self {
        Dep::Null
    }
}

impl From<bool> for Dep {
    fn from(v: bool) -> Self {
        Dep::Bool(v)
    }
}

macro_rules! dep_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Dep {
            fn from(v: $t) -> Self {
                Dep::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! dep_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Dep {
            fn from(v: $t) -> Self {
                Dep::UInt(u64::from(v))
            }
        })*
    };
}

dep_from_signed!(i8, i16, i32, i64);
dep_from_unsigned!(u8, u16, u32, u64);

impl From<usize> for Dep {
    fn from(v: usize) -> Self {
        Dep::UInt(v as u64)
    }
}

impl From<f32> for Dep {
    fn from(v: f32) -> Self {
        Dep::Float(f64::from(v))
    }
}

impl From<f64> for Dep {
    fn from(v: f64) -> Self {
        Dep::Float(v)
    }
}

impl From<&str> for Dep {
    fn from(v: &str) -> Self {
        Dep::Str(Rc::from(v))
    }
}

impl From<String> for Dep {
    fn from(v: String) -> Self {
        Dep::Str(Rc::from(v))
    }
}

impl From<Rc<str>> for Dep {
    fn from(v: Rc<str>) -> Self {
        Dep::Str(v)
    }
}

impl<T: Any> From<Rc<T>> for Dep {
    fn from(v: Rc<T>) -> Self {
        Dep::Ref(v as Rc<dyn Any>)
    }
}

impl<T: Any> From<&Rc<T>> for Dep {
    fn from(v: &Rc<T>) -> Self {
        Dep::by_ref(v)
    }
}

impl<T: Into<Dep>> From<Option<T>> for Dep {
    fn from(v: Option<T>) -> Self {
        v.map_or(Dep::Null, Into::into)
    }
}

/// Storage for a dependency list; most lists hold one or two values.
pub type DepList = SmallVec<[Dep; 4]>;

/// When an effect should run.
#[derive(Debug, Clone)]
pub enum Deps {
    /// After every render.
    Always,
    /// After the first render only.
    Once,
    /// When any element changed since the last execution.
    List(DepList),
}

impl Deps {
    /// An empty dependency list.
    pub fn none() -> Self {
        Deps::List(DepList::new())
    }

    /// Build a list from already-converted values.
    pub fn from_deps(deps: Vec<Dep>) -> Self {
        Deps::List(DepList::from_vec(deps))
    }

    /// Build a list from values of one type.
    pub fn list<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Dep>,
    {
        Deps::List(values.into_iter().map(Into::into).collect())
    }

    /// Decide whether a registration with these deps must execute, given the
    /// snapshot from its previous execution (`None` if it never ran).
    pub fn requires_run(&self, snapshot: Option<&Deps>) -> bool {
        match (self, snapshot) {
            (_, None) => true,
            (Deps::Always, Some(_)) => true,
            (Deps::Once, Some(_)) => false,
            (Deps::List(next), Some(Deps::List(prev))) => {
                next.len() != prev.len() || next.iter().zip(prev.iter()).any(|(a, b)| !a.same(b))
            }
            // The registration switched kinds between renders.
            (Deps::List(_), Some(_)) => true,
        }
    }
}

/// Build a [`Deps::List`] from heterogeneous values.
///
/// ```rust
/// use trellis_core::deps;
///
/// let count = 3;
/// let running = true;
/// let _deps = deps![count, running, "label"];
/// let _empty = deps![];
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        $crate::reactive::Deps::none()
    };
    ($($dep:expr),+ $(,)?) => {
        $crate::reactive::Deps::from_deps(::std::vec![$($crate::reactive::Dep::from($dep)),+])
    };
}

/// Teardown logic returned by an effect body.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    /// Wrap a teardown function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self(Box::new(f))
    }

    /// Run the teardown, consuming it.
    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup")
    }
}

/// Values an effect body may return.
pub trait EffectReturn {
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl EffectReturn for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl EffectReturn for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl EffectReturn for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

/// A type-erased effect body.
pub type EffectBody = Box<dyn FnOnce() -> Option<Cleanup>>;

/// One render's registration of an effect.
pub struct EffectRegistration {
    id: EffectId,
    deps: Deps,
    body: EffectBody,
}

impl EffectRegistration {
    /// Create a registration from any body returning an [`EffectReturn`].
    pub fn new<F, R>(id: EffectId, deps: Deps, body: F) -> Self
    where
        F: FnOnce() -> R + 'static,
        R: EffectReturn,
    {
        Self {
            id,
            deps,
            body: Box::new(move || body().into_cleanup()),
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn deps(&self) -> &Deps {
        &self.deps
    }

    pub(crate) fn into_parts(self) -> (EffectId, Deps, EffectBody) {
        (self.id, self.deps, self.body)
    }
}

impl fmt::Debug for EffectRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRegistration")
            .field("id", &self.id)
            .field("deps", &self.deps)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn scalars_compare_by_value() {
        assert_eq!(Dep::from(3), Dep::from(3));
        assert_ne!(Dep::from(3), Dep::from(4));
        assert_eq!(Dep::from("a"), Dep::from(String::from("a")));
        assert_eq!(Dep::from(true), Dep::from(true));
        assert_eq!(Dep::from(None::<i32>), Dep::from(()));
    }

    #[test]
    fn floats_use_same_value_semantics() {
        assert_eq!(Dep::from(f64::NAN), Dep::from(f64::NAN));
        assert_ne!(Dep::from(0.0), Dep::from(-0.0));
        assert_eq!(Dep::from(1.5), Dep::from(1.5));
    }

    #[test]
    fn different_kinds_never_match() {
        assert_ne!(Dep::from(1i32), Dep::from(1u32));
        assert_ne!(Dep::from(false), Dep::Null);
    }

    #[test]
    fn shared_values_compare_by_identity() {
        let a = Rc::new(vec![1, 2, 3]);
        let same = Rc::clone(&a);
        let equal_contents = Rc::new(vec![1, 2, 3]);

        assert_eq!(Dep::from(&a), Dep::from(same));
        assert_ne!(Dep::from(&a), Dep::from(equal_contents));
    }

    #[test]
    fn first_execution_always_runs() {
        assert!(Deps::Once.requires_run(None));
        assert!(Deps::none().requires_run(None));
        assert!(Deps::Always.requires_run(None));
    }

    #[test]
    fn once_and_empty_list_skip_after_first_run() {
        assert!(!Deps::Once.requires_run(Some(&Deps::Once)));
        assert!(!Deps::none().requires_run(Some(&Deps::none())));
    }

    #[test]
    fn always_runs_every_time() {
        assert!(Deps::Always.requires_run(Some(&Deps::Always)));
    }

    #[test]
    fn list_runs_only_on_positional_change() {
        let prev = deps![1, "a"];
        assert!(!deps![1, "a"].requires_run(Some(&prev)));
        assert!(deps![2, "a"].requires_run(Some(&prev)));
        assert!(deps![1, "b"].requires_run(Some(&prev)));
        assert!(deps![1].requires_run(Some(&prev)));
    }

    #[test]
    fn list_of_homogeneous_values() {
        let prev = Deps::list([1u32, 2, 3]);
        assert!(!Deps::list(vec![1u32, 2, 3]).requires_run(Some(&prev)));
    }

    #[test]
    fn cleanup_runs_once_when_consumed() {
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let cleanup = Cleanup::new(move || runs_clone.set(runs_clone.get() + 1));

        cleanup.run();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn registration_erases_return_type() {
        let reg = EffectRegistration::new(EffectId::new(0), Deps::Once, || Cleanup::new(|| {}));
        let (_, _, body) = reg.into_parts();
        assert!(body().is_some());

        let reg = EffectRegistration::new(EffectId::new(1), Deps::Once, || ());
        let (_, _, body) = reg.into_parts();
        assert!(body().is_none());
    }
}
