use crate::error::{DiffError, Result};
use crate::traits::{from_f64, Scalar, ScalarFunction};
use std::collections::HashMap;

/// OpCodes for the Stack-based Virtual Machine.
/// The VM operates on a stack of `Scalar` values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant `f64` value onto the stack.
    LoadConst(f64),
    /// Pushes the independent variable onto the stack.
    LoadVar,
    /// Pushes the value of a parameter (by index) onto the stack.
    LoadParam(usize),
    /// Pops top two values (b, a), pushes (a + b).
    Add,
    /// Pops top two values (b, a), pushes (a - b).
    Sub,
    /// Pops top two values (b, a), pushes (a * b).
    Mul,
    /// Pops top two values (b, a), pushes (a / b).
    Div,
    /// Pops top two values (b, a), pushes (a ^ b).
    Pow,
    /// Pops top value (a), pushes -a.
    Neg,
    Sin,
    Cos,
    Tan,
    Exp,
    /// Natural logarithm.
    Ln,
    Sqrt,
    Sinh,
    Cosh,
    Tanh,
    Abs,
}

impl OpCode {
    fn function(name: &str) -> Option<Self> {
        let op = match name {
            "sin" => OpCode::Sin,
            "cos" => OpCode::Cos,
            "tan" => OpCode::Tan,
            "exp" => OpCode::Exp,
            "ln" | "log" => OpCode::Ln,
            "sqrt" => OpCode::Sqrt,
            "sinh" => OpCode::Sinh,
            "cosh" => OpCode::Cosh,
            "tanh" => OpCode::Tanh,
            "abs" => OpCode::Abs,
            _ => return None,
        };
        Some(op)
    }
}

/// Represents a compiled sequence of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub ops: Vec<OpCode>,
}

/// Stack-based Virtual Machine for evaluating expressions.
///
/// The VM is stateless; `execute` takes all necessary context:
/// - `bytecode`: Instructions to run.
/// - `x`: Value of the independent variable.
/// - `params`: Parameter vector (read-only).
/// - `stack`: A mutable buffer for intermediate computations.
///
/// Returns the value left on the stack. Malformed bytecode yields NaN, which
/// the differentiation routines report as a domain error.
pub struct VM;

impl VM {
    pub fn execute<T: Scalar>(bytecode: &Bytecode, x: T, params: &[T], stack: &mut Vec<T>) -> T {
        stack.clear();

        for op in &bytecode.ops {
            let value = match op {
                OpCode::LoadConst(val) => from_f64(*val),
                OpCode::LoadVar => x,
                OpCode::LoadParam(idx) => params.get(*idx).copied().unwrap_or_else(T::nan),
                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Pow => {
                    let b = pop(stack);
                    let a = pop(stack);
                    match op {
                        OpCode::Add => a + b,
                        OpCode::Sub => a - b,
                        OpCode::Mul => a * b,
                        OpCode::Div => a / b,
                        _ => a.powf(b),
                    }
                }
                unary => {
                    let a = pop(stack);
                    match unary {
                        OpCode::Neg => -a,
                        OpCode::Sin => a.sin(),
                        OpCode::Cos => a.cos(),
                        OpCode::Tan => a.tan(),
                        OpCode::Exp => a.exp(),
                        OpCode::Ln => a.ln(),
                        OpCode::Sqrt => a.sqrt(),
                        OpCode::Sinh => a.sinh(),
                        OpCode::Cosh => a.cosh(),
                        OpCode::Tanh => a.tanh(),
                        _ => a.abs(),
                    }
                }
            };
            stack.push(value);
        }

        pop(stack)
    }
}

fn pop<T: Scalar>(stack: &mut Vec<T>) -> T {
    stack.pop().unwrap_or_else(T::nan)
}

// --- AST & Parser ---

/// Abstract Syntax Tree nodes for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary(Box<Expr>, char, Box<Expr>), // char is operator +, -, *, /, ^
    Unary(char, Box<Expr>),             // -
    Call(String, Box<Expr>),            // functions like sin(x)
}

/// Compiles an AST (`Expr`) into `Bytecode`.
/// Resolves the variable, parameter and constant names.
pub struct Compiler {
    pub variable: String,
    pub param_map: HashMap<String, usize>,
}

impl Compiler {
    pub fn new(variable: &str, param_names: &[String]) -> Self {
        let mut param_map = HashMap::new();
        for (i, name) in param_names.iter().enumerate() {
            param_map.insert(name.clone(), i);
        }

        Self {
            variable: variable.to_string(),
            param_map,
        }
    }

    pub fn compile(&self, expr: &Expr) -> Result<Bytecode> {
        let mut ops = Vec::new();
        self.compile_recursive(expr, &mut ops)?;
        Ok(Bytecode { ops })
    }

    fn compile_recursive(&self, expr: &Expr, ops: &mut Vec<OpCode>) -> Result<()> {
        match expr {
            Expr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            Expr::Variable(name) => {
                if *name == self.variable {
                    ops.push(OpCode::LoadVar);
                } else if let Some(&idx) = self.param_map.get(name) {
                    ops.push(OpCode::LoadParam(idx));
                } else {
                    match name.as_str() {
                        "pi" => ops.push(OpCode::LoadConst(std::f64::consts::PI)),
                        "e" => ops.push(OpCode::LoadConst(std::f64::consts::E)),
                        _ => return Err(DiffError::UnknownSymbol(name.clone())),
                    }
                }
            }
            Expr::Binary(left, op, right) => {
                self.compile_recursive(left, ops)?;
                self.compile_recursive(right, ops)?;
                let code = match op {
                    '+' => OpCode::Add,
                    '-' => OpCode::Sub,
                    '*' => OpCode::Mul,
                    '/' => OpCode::Div,
                    '^' => OpCode::Pow,
                    _ => return Err(DiffError::Parse(format!("unknown binary operator '{op}'"))),
                };
                ops.push(code);
            }
            Expr::Unary(op, operand) => {
                self.compile_recursive(operand, ops)?;
                match op {
                    '-' => ops.push(OpCode::Neg),
                    _ => return Err(DiffError::Parse(format!("unknown unary operator '{op}'"))),
                }
            }
            Expr::Call(func, arg) => {
                self.compile_recursive(arg, ops)?;
                let code =
                    OpCode::function(func).ok_or_else(|| DiffError::UnknownSymbol(func.clone()))?;
                ops.push(code);
            }
        }
        Ok(())
    }
}

// --- Simple Parser ---

/// Parses a string expression into an AST.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expression()?;
    if let Some(token) = parser.peek() {
        return Err(DiffError::Parse(format!("unexpected trailing token {token:?}")));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut num_str = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    num_str.push(d);
                    chars.next();
                } else if d == 'e' || d == 'E' {
                    // Exponent only when followed by a digit or a signed digit.
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    let next = lookahead.next();
                    let signed = matches!(next, Some('+') | Some('-'));
                    let digit = if signed { lookahead.next() } else { next };
                    if !matches!(digit, Some(ch) if ch.is_ascii_digit()) {
                        break;
                    }
                    num_str.push(d);
                    chars.next();
                    if signed {
                        if let Some(sign) = chars.next() {
                            num_str.push(sign);
                        }
                    }
                } else {
                    break;
                }
            }
            let value = num_str
                .parse()
                .map_err(|_| DiffError::Parse(format!("invalid number '{num_str}'")))?;
            tokens.push(Token::Number(value));
        } else if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Identifier(ident));
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                _ => return Err(DiffError::Parse(format!("unexpected character '{c}'"))),
            };
            tokens.push(token);
            chars.next();
        }
    }
    Ok(tokens)
}

/// Bound on the depth of the parsed tree, counting parentheses, unary
/// minus, exponents and binary operator chains.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).cloned()
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(DiffError::Parse("expression nested too deeply".to_string()));
        }
        Ok(())
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;
        let entered = self.depth;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => '+',
                Token::Minus => '-',
                _ => break,
            };
            self.consume();
            self.enter()?;
            let right = self.parse_term()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        self.depth = entered;
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        let entered = self.depth;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => '*',
                Token::Slash => '/',
                _ => break,
            };
            self.consume();
            self.enter()?;
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        self.depth = entered;
        Ok(left)
    }

    // Unary minus binds looser than '^': -x^2 == -(x^2).
    fn parse_unary(&mut self) -> Result<Expr> {
        self.enter()?;
        let expr = self.parse_signed();
        self.depth -= 1;
        expr
    }

    fn parse_signed(&mut self) -> Result<Expr> {
        if let Some(Token::Minus) = self.peek() {
            self.consume();
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary('-', Box::new(expr)));
        }
        self.parse_power()
    }

    // Right associative: 2^3^2 == 2^(3^2).
    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(Box::new(base), '^', Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.consume(); // eat '('
                    let arg = self.parse_expression()?;
                    self.expect_rparen()?;
                    Ok(Expr::Call(name, Box::new(arg)))
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            Some(token) => Err(DiffError::Parse(format!("unexpected token {token:?}"))),
            None => Err(DiffError::Parse("unexpected end of expression".to_string())),
        }
    }

    fn expect_rparen(&mut self) -> Result<()> {
        match self.consume() {
            Some(Token::RParen) => Ok(()),
            _ => Err(DiffError::Parse("expected ')'".to_string())),
        }
    }
}

// --- Expression ---

/// A compiled expression of one variable, usable wherever a
/// [`ScalarFunction`] is expected.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    bytecode: Bytecode,
    params: Vec<f64>,
}

impl Expression {
    /// Compiles `source` with `variable` as the independent variable.
    pub fn compile(source: &str, variable: &str) -> Result<Self> {
        Self::with_params(source, variable, &[])
    }

    /// Compiles `source` with named constant parameters.
    pub fn with_params(source: &str, variable: &str, params: &[(String, f64)]) -> Result<Self> {
        let names: Vec<String> = params.iter().map(|(name, _)| name.clone()).collect();
        let compiler = Compiler::new(variable, &names);
        let expr = parse(source)?;
        let bytecode = compiler.compile(&expr)?;
        Ok(Self {
            source: source.to_string(),
            bytecode,
            params: params.iter().map(|(_, value)| *value).collect(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }
}

impl<T: Scalar> ScalarFunction<T> for Expression {
    fn eval(&self, x: T) -> T {
        let params: Vec<T> = self.params.iter().map(|&p| from_f64(p)).collect();
        let mut stack = Vec::with_capacity(self.bytecode.ops.len());
        VM::execute(&self.bytecode, x, &params, &mut stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richardson::richardson_derivative;

    fn eval(source: &str, x: f64) -> f64 {
        let expr = Expression::compile(source, "x").expect("expression should compile");
        ScalarFunction::<f64>::eval(&expr, x)
    }

    #[test]
    fn respects_precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(eval("2 ^ 3 ^ 2", 0.0), 512.0);
        assert_eq!(eval("-x ^ 2", 3.0), -9.0);
        assert_eq!(eval("8 / 4 / 2", 0.0), 1.0);
        assert_eq!(eval("x - 1 - 1", 5.0), 3.0);
    }

    #[test]
    fn supports_scientific_notation_and_constants() {
        assert!((eval("1.5e2 + 2E-1", 0.0) - 150.2).abs() < 1e-12);
        assert!((eval("cos(pi)", 0.0) + 1.0).abs() < 1e-15);
        assert!((eval("ln(e)", 0.0) - 1.0).abs() < 1e-15);
        // A bare 'e' after a number is not an exponent.
        assert!((eval("2*e", 0.0) - 2.0 * std::f64::consts::E).abs() < 1e-15);
    }

    #[test]
    fn evaluates_tanh_profile() {
        let value = eval("1 + 0.5*tanh(2*x)", 0.25);
        assert!((value - (1.0 + 0.5 * 0.5_f64.tanh())).abs() < 1e-15);
    }

    #[test]
    fn unknown_names_are_rejected_at_compile_time() {
        assert_eq!(
            Expression::compile("y + 1", "x"),
            Err(DiffError::UnknownSymbol("y".to_string()))
        );
        assert_eq!(
            Expression::compile("erf(x)", "x"),
            Err(DiffError::UnknownSymbol("erf".to_string()))
        );
    }

    #[test]
    fn deep_nesting_is_a_parse_error() {
        let nested = format!("{}x{}", "(".repeat(200_000), ")".repeat(200_000));
        let err = Expression::compile(&nested, "x").expect_err("too deep");
        assert_eq!(err, DiffError::Parse("expression nested too deeply".to_string()));

        let negated = format!("{}x", "-".repeat(200_000));
        assert!(Expression::compile(&negated, "x").is_err());

        let long_sum = vec!["x"; 200_000].join(" + ");
        assert!(Expression::compile(&long_sum, "x").is_err());

        let moderate = format!("{}x{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(eval(&moderate, 2.5), 2.5);
        assert_eq!(eval(&vec!["x"; 100].join(" + "), 1.0), 100.0);
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        for source in ["1 +", "(x", "x )", "2 $ 3", ""] {
            let err = Expression::compile(source, "x").expect_err(source);
            assert!(matches!(err, DiffError::Parse(_)), "{source}: {err:?}");
        }
    }

    #[test]
    fn parameters_resolve_by_name() {
        let params = vec![("a".to_string(), 3.0), ("b".to_string(), -1.0)];
        let err = Expression::with_params("a*x + b", "t", &params).unwrap_err();
        assert_eq!(err, DiffError::UnknownSymbol("x".to_string()));

        let expr = Expression::with_params("a*t + b", "t", &params).expect("compiles");
        assert_eq!(ScalarFunction::<f64>::eval(&expr, 2.0), 5.0);
    }

    #[test]
    fn compiled_cubic_differentiates_like_a_closure() {
        let expr = Expression::compile("x^3", "x").unwrap();
        let cubic = |x: f64| x * x * x;
        let from_expr = richardson_derivative(&expr, 2.0, 0.1, 2).unwrap();
        let from_closure = richardson_derivative(&cubic, 2.0, 0.1, 2).unwrap();
        for (a, b) in from_expr.iter().zip(&from_closure) {
            assert!((a - b).abs() < 1e-10);
        }
        assert!((from_expr[0] - 12.01).abs() < 1e-10);
    }

    #[test]
    fn malformed_bytecode_evaluates_to_nan() {
        let code = Bytecode {
            ops: vec![OpCode::Add],
        };
        let mut stack = Vec::new();
        assert!(VM::execute(&code, 1.0_f64, &[], &mut stack).is_nan());
    }
}
