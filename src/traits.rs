//! Shared trait abstractions for coordinate transforms
//!
//! Geographic projections, the linear world transform and the viewport zoom
//! transform all share the same project/invert shape. Either direction may
//! fail for inputs outside the transform's domain, which is reported as
//! `None` rather than an error.

use std::marker::PhantomData;
use std::sync::Arc;

/// Trait for reversible coordinate transformation operations
pub trait Transform<In, Out> {
    /// Transform from the source space into the target space
    fn project(&self, v: In) -> Option<Out>;

    /// Transform from the target space back into the source space
    fn invert(&self, v: Out) -> Option<In>;
}

impl<In, Out, T> Transform<In, Out> for Arc<T>
where
    T: Transform<In, Out> + ?Sized,
{
    fn project(&self, v: In) -> Option<Out> {
        (**self).project(v)
    }

    fn invert(&self, v: Out) -> Option<In> {
        (**self).invert(v)
    }
}

impl<In, Out, T> Transform<In, Out> for Box<T>
where
    T: Transform<In, Out> + ?Sized,
{
    fn project(&self, v: In) -> Option<Out> {
        (**self).project(v)
    }

    fn invert(&self, v: Out) -> Option<In> {
        (**self).invert(v)
    }
}

/// `second ∘ first`: projects through `first` then `second`, inverts in the
/// opposite order.
pub struct Composite<First, Second, Mid> {
    first: First,
    second: Second,
    _mid: PhantomData<fn() -> Mid>,
}

impl<First, Second, Mid> Composite<First, Second, Mid> {
    pub fn new(first: First, second: Second) -> Self {
        Self {
            first,
            second,
            _mid: PhantomData,
        }
    }

    pub fn first(&self) -> &First {
        &self.first
    }

    pub fn second(&self) -> &Second {
        &self.second
    }
}

impl<In, Mid, Out, First, Second> Transform<In, Out> for Composite<First, Second, Mid>
where
    First: Transform<In, Mid>,
    Second: Transform<Mid, Out>,
{
    fn project(&self, v: In) -> Option<Out> {
        self.first.project(v).and_then(|mid| self.second.project(mid))
    }

    fn invert(&self, v: Out) -> Option<In> {
        self.second.invert(v).and_then(|mid| self.first.invert(mid))
    }
}

impl<First: Clone, Second: Clone, Mid> Clone for Composite<First, Second, Mid> {
    fn clone(&self) -> Self {
        Self::new(self.first.clone(), self.second.clone())
    }
}

impl<First: std::fmt::Debug, Second: std::fmt::Debug, Mid> std::fmt::Debug
    for Composite<First, Second, Mid>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field("first", &self.first)
            .field("second", &self.second)
            .finish()
    }
}
