//! Target identity and construction.
//!
//! A [`Target`] wraps one task function together with a fixed argument list.
//! Its identity is structural: the id is derived from the function's path and
//! the serialized arguments, so constructing the same description twice yields
//! an equal id, no matter where the construction happens.

use std::fmt;
use std::sync::Arc;

use crate::context::TaskContext;
use crate::error::{TaskError, TaskResult};

/// Structural identity of a target.
///
/// Format: `"{function_path}({serialized_args})"`. Cheap to clone and usable
/// as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(Arc<str>);

impl TargetId {
    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An argument value a target may carry.
///
/// Targets are restricted to these primitive, identity-serializable types so
/// that equal arguments always produce equal ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgValue {
    /// A text argument.
    Text(String),
    /// An integer argument.
    Int(i64),
    /// A boolean argument.
    Bool(bool),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Text(s) => write!(f, "{s:?}"),
            ArgValue::Int(i) => write!(f, "{i}"),
            ArgValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Conversion into [`ArgValue`] for the supported argument types.
pub trait TaskArg: Clone + Send + Sync + 'static {
    /// The serializable value of this argument.
    fn to_value(&self) -> ArgValue;
}

impl TaskArg for String {
    fn to_value(&self) -> ArgValue {
        ArgValue::Text(self.clone())
    }
}

impl TaskArg for &'static str {
    fn to_value(&self) -> ArgValue {
        ArgValue::Text((*self).to_string())
    }
}

impl TaskArg for i64 {
    fn to_value(&self) -> ArgValue {
        ArgValue::Int(*self)
    }
}

impl TaskArg for i32 {
    fn to_value(&self) -> ArgValue {
        ArgValue::Int((*self).into())
    }
}

impl TaskArg for u32 {
    fn to_value(&self) -> ArgValue {
        ArgValue::Int((*self).into())
    }
}

impl TaskArg for bool {
    fn to_value(&self) -> ArgValue {
        ArgValue::Bool(*self)
    }
}

/// A fixed, typed argument list for a target.
///
/// Implemented for tuples of [`TaskArg`] values up to arity 4, and for `()`
/// for argument-free tasks.
pub trait TaskArgs: Clone + Send + Sync + 'static {
    /// Serializable values of the arguments, in declaration order.
    fn values(&self) -> Vec<ArgValue>;
}

impl TaskArgs for () {
    fn values(&self) -> Vec<ArgValue> {
        Vec::new()
    }
}

/// A task function callable with the typed argument list `A`.
///
/// The first parameter is always a [`TaskContext`]; the remaining parameters
/// must match `A` element for element. A mismatched count or an unsupported
/// argument type is a compile error.
pub trait TaskFn<A>: Send + Sync + 'static {
    /// Invoke the function with the given context and arguments.
    fn call(&self, ctx: &TaskContext, args: &A) -> TaskResult;
}

impl<F> TaskFn<()> for F
where
    F: Fn(&TaskContext) -> TaskResult + Send + Sync + 'static,
{
    fn call(&self, ctx: &TaskContext, _args: &()) -> TaskResult {
        self(ctx)
    }
}

macro_rules! impl_task_tuple {
    ($($arg:ident . $idx:tt),+) => {
        impl<$($arg: TaskArg),+> TaskArgs for ($($arg,)+) {
            fn values(&self) -> Vec<ArgValue> {
                vec![$(self.$idx.to_value()),+]
            }
        }

        impl<F, $($arg: TaskArg),+> TaskFn<($($arg,)+)> for F
        where
            F: Fn(&TaskContext, $($arg),+) -> TaskResult + Send + Sync + 'static,
        {
            fn call(&self, ctx: &TaskContext, args: &($($arg,)+)) -> TaskResult {
                self(ctx, $(args.$idx.clone()),+)
            }
        }
    };
}

impl_task_tuple!(A1.0);
impl_task_tuple!(A1.0, A2.1);
impl_task_tuple!(A1.0, A2.1, A3.2);
impl_task_tuple!(A1.0, A2.1, A3.2, A4.3);

/// A structurally-identified, runnable wrapper around a task function and its
/// fixed arguments.
///
/// Two constructions for the same function with equal arguments compare equal
/// by id; different arguments yield distinct ids, so the same function can be
/// depended on with several argument sets as separate dependencies.
///
/// # Example
///
/// ```ignore
/// fn compress(ctx: &TaskContext, level: i64) -> TaskResult { ... }
///
/// deps(ctx, (
///     Target::with_args(compress, (1i64,))?,
///     Target::with_args(compress, (9i64,))?,
/// ))?;
/// ```
#[derive(Clone)]
pub struct Target {
    id: TargetId,
    name: String,
    body: Arc<dyn Fn(&TaskContext) -> TaskResult + Send + Sync>,
}

impl Target {
    /// Wrap an argument-free task function.
    pub fn new<F>(f: F) -> Result<Target, TaskError>
    where
        F: TaskFn<()>,
    {
        Self::with_args(f, ())
    }

    /// Wrap a task function together with a typed argument list.
    ///
    /// Fails with [`TaskError::Construction`] when the callable has no stable
    /// structural identity (a closure, or a plain function pointer that lost
    /// its path).
    pub fn with_args<F, A>(f: F, args: A) -> Result<Target, TaskError>
    where
        F: TaskFn<A>,
        A: TaskArgs,
    {
        let path = fn_path::<F>()?;
        let name = path
            .rsplit("::")
            .next()
            .unwrap_or(path.as_str())
            .to_string();
        let rendered: Vec<String> = args.values().iter().map(ToString::to_string).collect();
        let id = TargetId(format!("{path}({})", rendered.join(",")).into());
        let body: Arc<dyn Fn(&TaskContext) -> TaskResult + Send + Sync> =
            Arc::new(move |ctx: &TaskContext| f.call(ctx, &args));
        Ok(Target { id, name, body })
    }

    /// The structural id of this target.
    pub fn id(&self) -> &TargetId {
        &self.id
    }

    /// The display name (function name), not required to be unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kebab-cased display label, used for log spans.
    pub fn label(&self) -> String {
        kebab_case(&self.name)
    }

    /// Invoke the underlying function.
    pub fn run(&self, ctx: &TaskContext) -> TaskResult {
        (self.body)(ctx)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target").field("id", &self.id).finish()
    }
}

/// Either an already built [`Target`] or a bare argument-free task function.
///
/// `deps` resolves its inputs through this trait once, at the top of the
/// call, before anything is scheduled. The `Marker` parameter only keeps the
/// two impl families apart; callers never name it.
pub trait IntoTarget<Marker> {
    /// Normalize into a [`Target`].
    fn into_target(self) -> Result<Target, TaskError>;
}

/// Marker for values that already are targets.
pub struct IsTarget;

/// Marker for bare task functions.
pub struct IsFn;

impl IntoTarget<IsTarget> for Target {
    fn into_target(self) -> Result<Target, TaskError> {
        Ok(self)
    }
}

impl IntoTarget<IsTarget> for &Target {
    fn into_target(self) -> Result<Target, TaskError> {
        Ok(self.clone())
    }
}

impl<F> IntoTarget<IsFn> for F
where
    F: TaskFn<()>,
{
    fn into_target(self) -> Result<Target, TaskError> {
        Target::new(self)
    }
}

/// Path of the concrete fn item type `F`.
///
/// Relies on the fn item type being unique per function: `type_name` then
/// yields the function's module path, which is deterministic across runs.
/// Closures and fn pointers carry no such path and are rejected.
fn fn_path<F>() -> Result<String, TaskError> {
    let path = std::any::type_name::<F>();
    if path.is_empty() || path.contains("{{closure}}") || path.contains('(') || path.contains(' ')
    {
        return Err(TaskError::Construction {
            reason: format!("`{path}` has no stable name, use a named fn item"),
        });
    }
    Ok(path.to_string())
}

#[cfg(test)]
pub(crate) fn test_id(s: &str) -> TargetId {
    TargetId(Arc::from(s))
}

/// Normalize a function name into a log-friendly label:
/// `camelCase` becomes `camel-case` and underscores become dashes.
fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch == '_' {
            out.push('-');
            prev_lower = false;
        } else if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}
