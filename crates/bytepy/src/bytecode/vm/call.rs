//! Function creation and invocation.
//!
//! `CALL_FUNCTION` binds arguments into a fresh locals scope and runs the
//! callee's code in a child frame to completion before the caller continues.

use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::{Frame, VM};
use crate::{
    exception::{RunError, RunResult},
    function::FunctionObject,
    io::PrintWriter,
    namespace::Namespace,
    resource::ResourceTracker,
    tracer::VmTracer,
    value::Value,
};

/// Positional arguments, inline for the common small call.
type ArgPool = SmallVec<[Value; 4]>;

impl<T: ResourceTracker, P: PrintWriter, Tr: VmTracer> VM<'_, T, P, Tr> {
    /// `CALL_FUNCTION argc`: the low byte of the immediate is the positional
    /// count, the next byte the keyword count.
    ///
    /// Stack layout, top first: keyword pairs (value above name), positionals
    /// (last argument on top), callee.
    #[inline(never)]
    pub(super) fn call_function(&mut self, frame: &mut Frame) -> RunResult<()> {
        let [positional_count, keyword_count, ..] = frame.read_arg()?.to_le_bytes();

        let mut keywords = Vec::with_capacity(usize::from(keyword_count));
        for _ in 0..keyword_count {
            let value = frame.pop()?;
            let name = frame.pop()?;
            keywords.push((name, value));
        }
        let positional: ArgPool = frame.pop_n(usize::from(positional_count))?.into_iter().collect();
        let callee = frame.pop()?;

        let result = match &callee {
            Value::Function(func) => self.call_python(frame, func, positional, keywords)?,
            Value::Builtin(builtin) => {
                if let Some((name, _)) = keywords.into_iter().next() {
                    return Err(RunError::InvalidKeyword {
                        function: builtin.to_string(),
                        name,
                    });
                }
                builtin.call(positional.into_iter().collect())?
            }
            other => return Err(RunError::NotCallable { value: other.clone() }),
        };
        frame.push(result);
        Ok(())
    }

    fn call_python(
        &mut self,
        caller: &Frame,
        func: &Rc<FunctionObject>,
        positional: ArgPool,
        keywords: Vec<(Value, Value)>,
    ) -> RunResult<Value> {
        let locals = bind_arguments(func, positional, keywords)?;

        let depth = caller.depth() + 1;
        self.tracker.check_recursion_depth(depth)?;
        let mut child = Frame::new(
            Rc::clone(func.code()),
            locals.into_scope(),
            Rc::clone(func.globals()),
            Rc::clone(caller.builtins()),
            depth,
        );

        self.tracer.on_call(Some(func.name()), depth + 1);
        let result = self.exec(&mut child)?;
        self.tracer.on_return(depth);
        Ok(result)
    }

    /// `MAKE_FUNCTION`: pops a code object, then one default per varname
    /// (last varname on top), and pushes the function. The immediate is read
    /// and ignored.
    pub(super) fn make_function(&mut self, frame: &mut Frame) -> RunResult<()> {
        frame.read_arg()?;
        let code = match frame.pop()? {
            Value::Code(code) => code,
            other => {
                return Err(RunError::type_mismatch(format!(
                    "MAKE_FUNCTION expected a code object, found '{}'",
                    other.type_name()
                )));
            }
        };

        let mut defaults = IndexMap::with_hasher(ahash::RandomState::new());
        for name in code.varnames().iter().rev() {
            defaults.insert(name.clone(), frame.pop()?);
        }
        let func = FunctionObject::new(code, Rc::clone(frame.globals()), defaults);
        self.tracer.on_make_function(func.name(), func.defaults().len());
        frame.push(Value::Function(Rc::new(func)));
        Ok(())
    }
}

/// Binds call arguments to the callee's parameters.
///
/// Parameters are visited from the last varname to the first. A keyword
/// argument wins; otherwise a parameter whose index is covered by the
/// positional arguments takes the next one from the tail of the pool;
/// otherwise the recorded default, if any. Parameters with neither stay
/// unbound and fail on first `LOAD_FAST`.
#[inline(never)]
fn bind_arguments(func: &FunctionObject, mut pool: ArgPool, keywords: Vec<(Value, Value)>) -> RunResult<Namespace> {
    let varnames = func.code().varnames();
    if pool.len() > varnames.len() {
        return Err(RunError::ArgumentCount {
            function: func.name().to_owned(),
            expected: varnames.len(),
            given: pool.len(),
        });
    }

    let mut bound_by_keyword: IndexMap<String, Value, ahash::RandomState> = IndexMap::default();
    for (name, value) in keywords {
        let invalid = |name: Value| RunError::InvalidKeyword {
            function: func.name().to_owned(),
            name,
        };
        let Value::Str(key) = &name else {
            return Err(invalid(name));
        };
        // unknown names and names already covered positionally or by another keyword
        let covered = match varnames.iter().position(|v| **v == **key) {
            Some(idx) => idx < pool.len() || bound_by_keyword.contains_key(&**key),
            None => true,
        };
        if covered {
            return Err(invalid(name));
        }
        bound_by_keyword.insert(key.to_string(), value);
    }

    let mut bindings = Vec::with_capacity(varnames.len());
    for (idx, name) in varnames.iter().enumerate().rev() {
        let value = if let Some(value) = bound_by_keyword.shift_remove(name.as_str()) {
            Some(value)
        } else if idx < pool.len() {
            pool.pop()
        } else {
            func.default_for(name).cloned()
        };
        if let Some(value) = value {
            bindings.push((name.as_str(), value));
        }
    }
    Ok(bindings.into_iter().rev().collect())
}
