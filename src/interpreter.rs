use std::{
    collections::HashMap,
    fmt,
    io,
    time::{Duration, Instant},
};

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast,
    token::Op,
};

/// Ceiling on top-level statements executed per `interpret` call.
const MAX_OPERATIONS: usize = 10_000;
/// Ceiling on iterations of a single loop invocation.
const MAX_LOOP_ITERATIONS: usize = 1_000;
/// Wall-clock limit for one `interpret` call.
const MAX_EXECUTION_TIME: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("Undefined function: {0}")]
    UndefinedFunction(String),
    #[error("Function {name} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Cannot perform {op} on non-numeric value: {value}")]
    NonNumericOperand { op: String, value: String },
    #[error("Input not available in this environment")]
    InputUnavailable,
    #[error("Input failed: {0}")]
    InputFailed(String),
    #[error("Maximum loop iteration limit exceeded")]
    LoopLimitExceeded,
    #[error("Maximum operation limit exceeded - possible infinite loop")]
    OperationLimitExceeded,
    #[error("Maximum execution time exceeded")]
    ExecutionTimeExceeded,
}

/// Any failure during execution, displayed with a uniform prefix.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Runtime Error: {kind}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
}

impl From<ErrorKind> for RuntimeError {
    fn from(kind: ErrorKind) -> Self {
        RuntimeError { kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(value) => *value,
            Value::Number(number) => *number != 0.0,
            Value::Str(string) => !string.is_empty(),
        }
    }

    fn as_number(&self, op: &str) -> Result<f64, ErrorKind> {
        match self {
            Value::Number(number) => Ok(*number),
            _ => Err(ErrorKind::NonNumericOperand {
                op: op.to_string(),
                value: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(value) => write!(f, "{}", if *value { "true" } else { "false" }),
            Value::Number(number) => write!(f, "{}", number),
            Value::Str(string) => write!(f, "{}", string),
        }
    }
}

#[derive(Debug, Clone)]
struct Function {
    parameters: Vec<String>,
    body: Vec<ast::Stmt>,
}

pub type InputCallback = Box<dyn FnMut(&str) -> io::Result<String>>;

/// Tree-walking interpreter. One instance owns one environment and one
/// function table; concurrent programs need separate instances.
pub struct Interpreter {
    environment: HashMap<String, Value>,
    functions: HashMap<String, Function>,
    output: Vec<String>,
    input_callback: Option<InputCallback>,
    operation_count: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            environment: HashMap::new(),
            functions: HashMap::new(),
            output: Vec::new(),
            input_callback: None,
            operation_count: 0,
        }
    }

    /// Installs the handler the `nivesh` statement suspends on. Without one,
    /// executing `nivesh` is a runtime error. Survives `reset`.
    pub fn set_input_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&str) -> io::Result<String> + 'static,
    {
        self.input_callback = Some(Box::new(callback));
    }

    /// Clears environment, function table, output buffer and operation
    /// counter, readying the instance for an unrelated program.
    pub fn reset(&mut self) {
        self.environment.clear();
        self.functions.clear();
        self.output.clear();
        self.operation_count = 0;
    }

    /// Executes a program and returns its buffered output, one line per
    /// print statement. The operation counter and wall clock are checked
    /// between top-level statements only; loops are bounded separately by
    /// their own iteration cap.
    pub fn interpret(&mut self, program: &ast::Program) -> Result<String, RuntimeError> {
        self.output.clear();
        self.operation_count = 0;
        let started = Instant::now();

        debug!(statements = program.body.len(), "executing program");

        for statement in &program.body {
            self.execute_statement(statement)?;

            self.operation_count += 1;
            if self.operation_count > MAX_OPERATIONS {
                return Err(ErrorKind::OperationLimitExceeded.into());
            }
            if started.elapsed() > MAX_EXECUTION_TIME {
                return Err(ErrorKind::ExecutionTimeExceeded.into());
            }
        }

        Ok(self.output.join("\n"))
    }

    /// Runs one statement and yields its value: the expression's value for
    /// expression and return statements, Null for everything else. Function
    /// calls capture the last executed statement's value as their result.
    fn execute_statement(&mut self, statement: &ast::Stmt) -> Result<Value, ErrorKind> {
        trace!(?statement, "execute");

        match statement {
            ast::Stmt::VarDecl(decl) => {
                let value = match &decl.initializer {
                    Some(initializer) => self.evaluate_expression(initializer)?,
                    None => Value::Null,
                };
                self.environment.insert(decl.name.clone(), value);
                Ok(Value::Null)
            }

            ast::Stmt::Print(print) => {
                let value = self.evaluate_expression(&print.expression)?;
                self.output.push(value.to_string());
                Ok(Value::Null)
            }

            ast::Stmt::Input(input) => {
                let prompt = format!("Enter value for {}:", input.variable);
                let callback = self
                    .input_callback
                    .as_mut()
                    .ok_or(ErrorKind::InputUnavailable)?;
                let raw = callback(&prompt).map_err(|err| ErrorKind::InputFailed(err.to_string()))?;

                // numeric if it parses as a number, otherwise kept as a string
                let value = match raw.trim().parse::<f64>() {
                    Ok(number) => Value::Number(number),
                    Err(_) => Value::Str(raw),
                };
                self.environment.insert(input.variable.clone(), value);
                Ok(Value::Null)
            }

            ast::Stmt::If(if_stmt) => {
                let condition = self.evaluate_expression(&if_stmt.condition)?;
                if condition.is_truthy() {
                    for statement in &if_stmt.consequent {
                        self.execute_statement(statement)?;
                    }
                } else if let Some(alternate) = &if_stmt.alternate {
                    for statement in alternate {
                        self.execute_statement(statement)?;
                    }
                }
                Ok(Value::Null)
            }

            ast::Stmt::While(while_stmt) => {
                let mut iterations = 0usize;
                while self.evaluate_expression(&while_stmt.condition)?.is_truthy() {
                    iterations += 1;
                    if iterations > MAX_LOOP_ITERATIONS {
                        return Err(ErrorKind::LoopLimitExceeded);
                    }

                    for statement in &while_stmt.body {
                        self.execute_statement(statement)?;
                    }
                }
                Ok(Value::Null)
            }

            ast::Stmt::Function(decl) => {
                self.functions.insert(
                    decl.name.clone(),
                    Function {
                        parameters: decl.parameters.clone(),
                        body: decl.body.clone(),
                    },
                );
                Ok(Value::Null)
            }

            ast::Stmt::Return(ret) => match &ret.value {
                Some(value) => self.evaluate_expression(value),
                None => Ok(Value::Null),
            },

            ast::Stmt::Expression(expression) => self.evaluate_expression(expression),
        }
    }

    fn evaluate_expression(&mut self, expression: &ast::Expr) -> Result<Value, ErrorKind> {
        match expression {
            ast::Expr::NumberLit(number) => Ok(Value::Number(*number)),
            ast::Expr::StringLit(string) => Ok(Value::Str(string.clone())),

            ast::Expr::Identifier(name) => self
                .environment
                .get(name)
                .cloned()
                .ok_or_else(|| ErrorKind::UndefinedVariable(name.clone())),

            ast::Expr::Unary(unary) => {
                let operand = self.evaluate_expression(&unary.operand)?;
                match unary.op {
                    Op::Minus => Ok(Value::Number(-operand.as_number("unary -")?)),
                    Op::Bang => Ok(Value::Bool(!operand.is_truthy())),
                    _ => unreachable!("parser only produces '-' and '!' prefix operators"),
                }
            }

            ast::Expr::Binary(binary) => {
                let left = self.evaluate_expression(&binary.left)?;
                let right = self.evaluate_expression(&binary.right)?;
                self.apply_binary_op(binary.op, left, right)
            }

            ast::Expr::Call(call) => self.evaluate_call(call),
        }
    }

    fn apply_binary_op(&self, op: Op, left: Value, right: Value) -> Result<Value, ErrorKind> {
        match op {
            // numeric addition when both sides are numbers, otherwise
            // stringify both and concatenate
            Op::Plus => match (&left, &right) {
                (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left + right)),
                _ => Ok(Value::Str(format!("{}{}", left, right))),
            },

            Op::Minus => Ok(Value::Number(
                left.as_number("-")? - right.as_number("-")?,
            )),
            Op::Star => Ok(Value::Number(
                left.as_number("*")? * right.as_number("*")?,
            )),
            Op::Slash => {
                let left = left.as_number("/")?;
                let right = right.as_number("/")?;
                if right == 0.0 {
                    return Err(ErrorKind::DivisionByZero);
                }
                Ok(Value::Number(left / right))
            }

            // value equality without coercion
            Op::EqualEqual => Ok(Value::Bool(left == right)),
            Op::BangEqual => Ok(Value::Bool(left != right)),

            Op::Lesser => Ok(Value::Bool(left.as_number("<")? < right.as_number("<")?)),
            Op::LesserEqual => Ok(Value::Bool(
                left.as_number("<=")? <= right.as_number("<=")?,
            )),
            Op::Greater => Ok(Value::Bool(left.as_number(">")? > right.as_number(">")?)),
            Op::GreaterEqual => Ok(Value::Bool(
                left.as_number(">=")? >= right.as_number(">=")?,
            )),

            // both operands are evaluated before either truthiness test
            Op::AndAnd => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
            Op::OrOr => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),

            Op::Assign | Op::Bang => {
                unreachable!("parser never produces '{}' as a binary operator", op.as_str())
            }
        }
    }

    /// Calls operate on a snapshot copy of the caller's environment: the
    /// callee sees every caller binding plus its parameters, and the
    /// pre-call environment is restored on exit, success or failure.
    fn evaluate_call(&mut self, call: &ast::CallExpr) -> Result<Value, ErrorKind> {
        let function = self
            .functions
            .get(&call.callee)
            .cloned()
            .ok_or_else(|| ErrorKind::UndefinedFunction(call.callee.clone()))?;

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            arguments.push(self.evaluate_expression(argument)?);
        }

        if arguments.len() != function.parameters.len() {
            return Err(ErrorKind::ArityMismatch {
                name: call.callee.clone(),
                expected: function.parameters.len(),
                actual: arguments.len(),
            });
        }

        let snapshot = self.environment.clone();
        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            self.environment.insert(parameter.clone(), argument);
        }

        let mut result = Ok(Value::Null);
        for statement in &function.body {
            result = self.execute_statement(statement);
            if result.is_err() {
                break;
            }
        }

        self.environment = snapshot;
        result
    }
}
