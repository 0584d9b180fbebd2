//! The small-step evaluator.
//!
//! [`State`] owns everything one evaluation needs: the stack of
//! [`Layer`]s, the [`Store`], and the single `result` register. `step`
//! advances the topmost layer exactly one node's worth of work; `run`
//! drives `step` to completion, triggering the garbage collector when the
//! store's occupancy crosses [`EvalConfig::gc_high_watermark`].

use crate::ast::{Expr, Node};
use crate::diagnostics::{Error, Result, SourceLocation};
use crate::environment;
use crate::evaluator::config::EvalConfig;
use crate::evaluator::gc;
use crate::evaluator::layer::{deep_clone_stack, Layer};
use crate::numeric::Rational;
use crate::stdlib::host::HostRegistry;
use crate::value::{ClosureData, ContinuationData, Store, StoreIndex, Value};
use log::debug;

/// One entry of the `.send` output buffer: a channel number paired with
/// its payload.
#[derive(Debug, Clone)]
pub enum OutputPayload {
    /// A numeric payload.
    Number(Rational),
    /// A string payload.
    String(String),
}

/// The complete mutable state of one evaluation.
pub struct State {
    /// The evaluation stack. `stack[0]` is the bottom frame, created once
    /// at construction and never popped; its environment is the target of
    /// `.reg`.
    pub stack: Vec<Layer>,
    /// The value heap.
    pub store: Store,
    /// The single-slot result register, holding the most recently
    /// produced value.
    pub result: Value,
    /// Evaluator configuration.
    pub config: EvalConfig,
    /// The `.send` output buffer, reported after execution completes.
    pub output_buffer: Vec<(Rational, OutputPayload)>,
    /// Native callbacks reachable from `.py`. Empty unless an embedder
    /// registers something.
    pub host: HostRegistry,
    steps_taken: u64,
    gc_suppressed_until_capacity: Option<usize>,
}

impl State {
    /// Creates a fresh state with an empty bottom frame, ready to accept a
    /// top-level expression via [`State::push_program`].
    pub fn new(config: EvalConfig) -> Self {
        let global_env = environment::new_env();
        Self {
            stack: vec![Layer::sentinel(global_env)],
            store: Store::with_capacity(config.initial_store_capacity),
            result: Value::void(),
            config,
            output_buffer: Vec::new(),
            host: HostRegistry::new(),
            steps_taken: 0,
            gc_suppressed_until_capacity: None,
        }
    }

    /// Pushes a top-level program expression onto the bottom frame's
    /// environment, ready for `run` to drive to completion. The program
    /// shares the bottom frame's environment, which is how `.reg`'s
    /// registrations become ordinary lexically-visible bindings for the
    /// remainder of the program.
    pub fn push_program(&mut self, expr: Expr) {
        let env = self.stack[0].env.clone();
        self.stack.push(Layer::new_frame(expr, env));
    }

    /// Drives evaluation to completion, returning the final value.
    pub fn run(&mut self) -> Result<Value> {
        loop {
            if self.stack.len() == 1 {
                // Only the bottom sentinel remains: done.
                return Ok(self.result.clone());
            }
            self.maybe_collect();
            self.step()?;
        }
    }

    fn maybe_collect(&mut self) {
        if self.store.occupancy() < self.config.gc_high_watermark {
            return;
        }
        if let Some(suppressed_at) = self.gc_suppressed_until_capacity {
            if self.store.capacity() <= suppressed_at {
                return;
            }
        }
        let stats = gc::collect(&mut self.stack, &mut self.store, &mut self.result);
        debug!(
            "gc cycle: {} -> {} live cells (capacity {})",
            stats.before,
            stats.after,
            self.store.capacity()
        );
        let occupancy_after = self.store.occupancy();
        if occupancy_after >= self.config.gc_high_watermark {
            self.gc_suppressed_until_capacity = Some(self.store.capacity());
        } else {
            self.gc_suppressed_until_capacity = None;
        }
    }

    fn bump_steps(&mut self, at: SourceLocation) -> Result<()> {
        self.steps_taken += 1;
        if let Some(budget) = self.config.step_budget {
            if self.steps_taken > budget {
                return Err(Error::timeout(at, "evaluator step budget exhausted"));
            }
        }
        Ok(())
    }

    /// Advances the topmost layer by one unit of work.
    fn step(&mut self) -> Result<()> {
        let idx = self.stack.len() - 1;
        let expr = self.stack[idx]
            .expr
            .clone()
            .expect("non-sentinel layers always carry an expression");
        let span = expr.span;
        self.bump_steps(span)?;

        match &expr.node {
            Node::Number(n) => {
                self.result = Value::number(*n);
                self.stack.pop();
            }
            Node::String(s) => {
                self.result = Value::string(s.clone());
                self.stack.pop();
            }
            Node::Intrinsic(_) => {
                unreachable!("Intrinsic nodes are only ever inspected as a Call's callee")
            }
            Node::Variable(name) => {
                self.result = self.lookup_variable(idx, name, span)?;
                self.stack.pop();
            }
            Node::Lambda(lambda) => {
                let captured = environment::capture_lexical(&self.stack[idx].env);
                let data = ClosureData::new(captured, lambda.clone(), span);
                self.result = Value::closure(data);
                self.stack.pop();
            }
            Node::Letrec(bindings, body) => self.step_letrec(idx, bindings.clone(), body.clone())?,
            Node::If(cond, then_branch, else_branch) => {
                self.step_if(idx, cond.clone(), then_branch.clone(), else_branch.clone(), span)?
            }
            Node::Call(callee, args) => self.step_call(idx, callee.clone(), args.clone(), span)?,
            Node::Sequence(exprs) => self.step_sequence(idx, exprs.clone())?,
            Node::Query(name, maybe_closure) => {
                self.step_query(idx, name.clone(), maybe_closure.clone(), span)?
            }
            Node::Access(name, closure_expr) => {
                self.step_access(idx, name.clone(), closure_expr.clone(), span)?
            }
        }
        Ok(())
    }

    fn lookup_variable(&self, layer_idx: usize, name: &str, at: SourceLocation) -> Result<Value> {
        if Node::is_dynamic_name(name) {
            self.lookup_dynamic(name)
                .ok_or_else(|| Error::undefined_variable(at, format!("undefined dynamic variable {name}")))
        } else {
            let env = &self.stack[layer_idx].env;
            environment::lookup(env, name)
                .map(|loc| self.store.get(loc).clone())
                .ok_or_else(|| Error::undefined_variable(at, format!("undefined variable {name}")))
        }
    }

    /// Scans the live stack newest-first; within each frame layer, scans
    /// its environment newest-first.
    fn lookup_dynamic(&self, name: &str) -> Option<Value> {
        for layer in self.stack.iter().rev() {
            if !layer.frame {
                continue;
            }
            if let Some(loc) = environment::lookup(&layer.env, name) {
                return Some(self.store.get(loc).clone());
            }
        }
        None
    }

    /// Whether `name` is bound, dynamically, anywhere on the live stack.
    fn dynamic_is_bound(&self, name: &str) -> bool {
        self.stack
            .iter()
            .rev()
            .filter(|l| l.frame)
            .any(|l| environment::lookup(&l.env, name).is_some())
    }

    fn step_letrec(&mut self, idx: usize, bindings: Vec<crate::ast::Binding>, body: Expr) -> Result<()> {
        let total = bindings.len();
        let pc = self.stack[idx].pc;
        let env = self.stack[idx].env.clone();

        if pc == 0 {
            let mut slots = Vec::with_capacity(total);
            for binding in &bindings {
                let slot = self.store.put(Value::void());
                environment::push(&env, binding.name.clone(), slot);
                slots.push(slot);
            }
            self.stack[idx].local.letrec_slots = slots;
            self.stack[idx].pc = if total == 0 { total + 1 } else { 1 };
            if total == 0 {
                let tail = self.stack[idx].tail;
                self.stack.push(Layer::new(body, env).with_tail(tail));
                self.stack[idx].pc = total + 2;
            }
            return Ok(());
        }

        if pc >= 1 && pc <= total {
            if pc > 1 {
                let slot = self.stack[idx].local.letrec_slots[pc - 2];
                let value = self.result.clone();
                self.store.set(slot, value);
            }
            let binding_expr = bindings[pc - 1].expr.clone();
            self.stack[idx].pc = pc + 1;
            self.stack.push(Layer::new(binding_expr, env));
            return Ok(());
        }

        if pc == total + 1 {
            if total > 0 {
                let slot = self.stack[idx].local.letrec_slots[total - 1];
                let value = self.result.clone();
                self.store.set(slot, value);
            }
            let tail = self.stack[idx].tail;
            self.stack[idx].pc = total + 2;
            self.stack.push(Layer::new(body, env).with_tail(tail));
            return Ok(());
        }

        // pc == total + 2: body has returned.
        environment::pop_n(&env, total);
        self.stack.pop();
        Ok(())
    }

    fn step_if(
        &mut self,
        idx: usize,
        cond: Expr,
        then_branch: Expr,
        else_branch: Expr,
        at: SourceLocation,
    ) -> Result<()> {
        let pc = self.stack[idx].pc;
        let env = self.stack[idx].env.clone();
        match pc {
            0 => {
                self.stack[idx].pc = 1;
                self.stack.push(Layer::new(cond, env));
            }
            1 => {
                let n = self.result.as_number(at)?;
                let tail = self.stack[idx].tail;
                let branch = if n.is_truthy() { then_branch } else { else_branch };
                self.stack[idx].pc = 2;
                self.stack.push(Layer::new(branch, env).with_tail(tail));
            }
            _ => {
                self.stack.pop();
            }
        }
        Ok(())
    }

    fn step_sequence(&mut self, idx: usize, exprs: Vec<Expr>) -> Result<()> {
        let pc = self.stack[idx].pc;
        let env = self.stack[idx].env.clone();
        let len = exprs.len();
        if pc < len {
            let tail = self.stack[idx].tail && pc == len - 1;
            self.stack[idx].pc = pc + 1;
            self.stack.push(Layer::new(exprs[pc].clone(), env).with_tail(tail));
        } else {
            self.stack.pop();
        }
        Ok(())
    }

    fn step_query(
        &mut self,
        idx: usize,
        name: String,
        maybe_closure: Option<Expr>,
        at: SourceLocation,
    ) -> Result<()> {
        if Node::is_dynamic_name(&name) {
            self.result = Value::boolean(self.dynamic_is_bound(&name));
            self.stack.pop();
            return Ok(());
        }
        let closure_expr = maybe_closure.expect("lexical Query nodes always carry a closure expression");
        let pc = self.stack[idx].pc;
        let env = self.stack[idx].env.clone();
        if pc == 0 {
            self.stack[idx].pc = 1;
            self.stack.push(Layer::new(closure_expr, env));
        } else {
            let closure = self.result.as_closure(at)?.clone();
            let bound = closure.env.borrow().iter().any(|(n, _)| n == &name);
            self.result = Value::boolean(bound);
            self.stack.pop();
        }
        Ok(())
    }

    fn step_access(&mut self, idx: usize, name: String, closure_expr: Expr, at: SourceLocation) -> Result<()> {
        let pc = self.stack[idx].pc;
        let env = self.stack[idx].env.clone();
        if pc == 0 {
            self.stack[idx].pc = 1;
            self.stack.push(Layer::new(closure_expr, env));
        } else {
            let closure = self.result.as_closure(at)?.clone();
            let loc = closure
                .env
                .borrow()
                .iter()
                .rev()
                .find(|(n, _)| n == &name)
                .map(|(_, loc)| *loc)
                .ok_or_else(|| Error::undefined_variable(at, format!("{name} not bound in closure environment")))?;
            self.result = self.store.get(loc).clone();
            self.stack.pop();
        }
        Ok(())
    }

    fn step_call(&mut self, idx: usize, callee: Expr, args: Vec<Expr>, at: SourceLocation) -> Result<()> {
        if let Node::Intrinsic(name) = &callee.node {
            return self.step_intrinsic_call(idx, name.clone(), args, at);
        }
        self.step_user_call(idx, callee, args, at)
    }

    fn step_intrinsic_call(&mut self, idx: usize, name: String, args: Vec<Expr>, at: SourceLocation) -> Result<()> {
        let pc = self.stack[idx].pc;
        let env = self.stack[idx].env.clone();
        let len = args.len();

        if pc > 0 {
            self.stack[idx].local.args.push(self.result.clone());
        }
        if pc < len {
            self.stack[idx].pc = pc + 1;
            self.stack.push(Layer::new(args[pc].clone(), env));
            return Ok(());
        }

        let gathered = std::mem::take(&mut self.stack[idx].local.args);
        if name == ".call/cc" {
            self.invoke_call_cc(idx, gathered, at)?;
            return Ok(());
        }
        self.result = crate::stdlib::dispatch(&name, &gathered, at, self)?;
        self.stack.pop();
        Ok(())
    }

    fn invoke_call_cc(&mut self, idx: usize, args: Vec<Value>, at: SourceLocation) -> Result<()> {
        if args.len() != 1 {
            return Err(Error::arity(at, format!(".call/cc expects 1 argument, got {}", args.len())));
        }
        let closure = args[0].as_closure(at)?.clone();
        if closure.fun.params.len() != 1 {
            return Err(Error::arity(
                at,
                ".call/cc's argument must be a closure of exactly one parameter",
            ));
        }
        // Pop this call layer before capturing: the continuation resumes
        // *after* the call/cc call, not re-inside it.
        self.stack.pop();
        let snapshot = deep_clone_stack(&self.stack);
        let continuation = Value::continuation(ContinuationData::new(snapshot, at));

        let call_env = environment::from_bindings(closure.env.borrow().clone());
        let loc = self.store.put(continuation);
        environment::push(&call_env, closure.fun.params[0].clone(), loc);
        self.stack.push(Layer::new_frame(closure.fun.body.clone(), call_env));
        Ok(())
    }

    fn step_user_call(&mut self, idx: usize, callee: Expr, args: Vec<Expr>, at: SourceLocation) -> Result<()> {
        let pc = self.stack[idx].pc;
        let env = self.stack[idx].env.clone();
        let len = args.len();

        if pc == 0 {
            self.stack[idx].pc = 1;
            self.stack.push(Layer::new(callee, env));
            return Ok(());
        }
        if pc == 1 {
            self.stack[idx].local.callee = Some(self.result.clone());
            self.stack[idx].pc = 2;
            if len == 0 {
                return self.dispatch_user_call(idx, at);
            }
            self.stack.push(Layer::new(args[0].clone(), env));
            return Ok(());
        }
        // pc in [2, len+1]: an argument just returned.
        if pc <= len + 1 {
            self.stack[idx].local.args.push(self.result.clone());
            if pc < len + 1 {
                self.stack[idx].pc = pc + 1;
                self.stack.push(Layer::new(args[pc - 1].clone(), env));
                return Ok(());
            }
            return self.dispatch_user_call(idx, at);
        }
        // The call has already been dispatched (pc was bumped to
        // `usize::MAX` by `dispatch_user_call`'s non-tail path) and the
        // callee's body has returned: pop, letting `result` propagate.
        self.stack.pop();
        Ok(())
    }

    fn dispatch_user_call(&mut self, idx: usize, at: SourceLocation) -> Result<()> {
        let callee = self.stack[idx]
            .local
            .callee
            .clone()
            .expect("callee evaluated before arguments are dispatched");
        let args = std::mem::take(&mut self.stack[idx].local.args);

        if let Ok(continuation) = callee.as_continuation(at) {
            if args.len() != 1 {
                return Err(Error::arity(
                    at,
                    format!("continuation invocation expects 1 argument, got {}", args.len()),
                ));
            }
            let new_stack = deep_clone_stack(&continuation.stack.borrow());
            self.result = args.into_iter().next().unwrap();
            self.stack = new_stack;
            return Ok(());
        }

        let closure = callee.as_closure(at)?.clone();
        let params = &closure.fun.params;
        if params.len() != args.len() {
            return Err(Error::arity(
                at,
                format!("closure expects {} argument(s), got {}", params.len(), args.len()),
            ));
        }

        let call_env = environment::from_bindings(closure.env.borrow().clone());
        for (param, arg) in params.iter().zip(args.into_iter()) {
            let location = self.bind_argument(arg);
            environment::push(&call_env, param.clone(), location);
        }

        let is_tail = self.config.enable_tail_call_elision && self.stack[idx].tail;
        let body = closure.fun.body.clone();
        if is_tail {
            // `idx` is in tail position of its enclosing frame, and so is
            // every forwarding layer between that frame and `idx` (the
            // `If`/`Sequence`/`Letrec` layers left behind at their
            // "awaiting return" pc). None of them has anything left to do
            // but propagate `result` once this call returns, so the whole
            // chain collapses with the frame itself rather than only the
            // `Call` layer — that's what keeps tail recursion at O(1)
            // stack depth.
            let frame_start = self.stack[..=idx]
                .iter()
                .rposition(|layer| layer.frame)
                .expect("every layer is reachable from some enclosing frame");
            self.stack.truncate(frame_start);
        } else {
            // Mark this layer "done but awaiting the callee's return" by
            // pushing its pc past the last meaningful stage.
            self.stack[idx].pc = usize::MAX;
        }
        // The callee's body is always in tail position of its own,
        // freshly created frame, regardless of whether this call itself
        // was a tail call: a tail call made from within that body should
        // still collapse onto this frame.
        self.stack.push(Layer::new_frame(body, call_env).with_tail(true));
        Ok(())
    }

    /// Returns the store location an argument value should be bound to:
    /// its existing location if it has one (pass-by-reference for
    /// heap-backed values), or a freshly allocated cell otherwise.
    fn bind_argument(&mut self, value: Value) -> StoreIndex {
        match value.location() {
            Some(loc) => loc,
            None => self.store.put(value),
        }
    }
}
