use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            '^' => Some(Operator::Pow),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
            Operator::Pow => '^',
        }
    }

    /// Higher rank binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
            Operator::Pow => 3,
        }
    }

    /// Applies `left OP right`. Division by exactly zero yields positive
    /// infinity instead of failing.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            Operator::Div => {
                if right == 0.0 {
                    f64::INFINITY
                } else {
                    left / right
                }
            }
            Operator::Pow => left.powf(right),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Number(f64),
    Op(Operator),
}

/// Generic evaluation failure. The cause is kept for logging only.
#[derive(Debug, Error)]
#[error("malformed expression: {reason}")]
pub struct EvalError {
    reason: Reason,
}

#[derive(Debug, Error)]
enum Reason {
    #[error("empty expression")]
    Empty,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("operator '{0}' is missing an operand")]
    MissingOperand(Operator),
    #[error("{0} operands left without operators")]
    Unbalanced(usize),
}

impl From<Reason> for EvalError {
    fn from(reason: Reason) -> Self {
        EvalError { reason }
    }
}

pub struct Step {
    pub operation: String,
    pub result: f64,
}

pub struct EvaluationTrace {
    pub steps: Vec<Step>,
    pub detailed_mode: bool,
}

impl EvaluationTrace {
    pub fn new(detailed_mode: bool) -> Self {
        EvaluationTrace {
            steps: Vec::new(),
            detailed_mode,
        }
    }

    pub fn add_step(&mut self, operation: String, result: f64) {
        if self.detailed_mode {
            self.steps.push(Step { operation, result });
        }
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Lazy tokenizer over a raw expression.
///
/// Runs of digits and decimal points become one `Token::Number`; every
/// operator character becomes its own `Token::Op`. Anything else ends the
/// scan with an error.
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.input[self.pos..];
        let c = rest.chars().next()?;

        if is_number_char(c) {
            let len = rest.find(|ch: char| !is_number_char(ch)).unwrap_or(rest.len());
            let literal = &rest[..len];
            self.pos += len;
            return Some(
                literal
                    .parse::<f64>()
                    .map(Token::Number)
                    .map_err(|_| Reason::InvalidNumber(literal.to_string()).into()),
            );
        }

        self.pos += c.len_utf8();
        match Operator::from_char(c) {
            Some(op) => Some(Ok(Token::Op(op))),
            None => {
                // Nothing after an unknown character is meaningful.
                self.pos = self.input.len();
                Some(Err(Reason::UnexpectedChar(c).into()))
            }
        }
    }
}

/// Returns true for the value `/` produces when dividing by zero.
pub fn is_division_by_zero(value: f64) -> bool {
    value == f64::INFINITY
}

pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    evaluate_traced(expression, &mut EvaluationTrace::new(false))
}

/// Single left-to-right pass over the token stream with an operand stack and
/// an operator stack. Operators on the stack with precedence greater than or
/// equal to the incoming one are applied first, which makes every operator
/// left-associative (`2^3^2` is `(2^3)^2`).
pub fn evaluate_traced(
    expression: &str,
    trace: &mut EvaluationTrace,
) -> Result<f64, EvalError> {
    let mut operands: Vec<f64> = Vec::new();
    let mut operators: Vec<Operator> = Vec::new();

    for token in Scanner::new(expression) {
        match token? {
            Token::Number(n) => operands.push(n),
            Token::Op(op) => {
                while let Some(&top) = operators.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    operators.pop();
                    reduce(top, &mut operands, trace)?;
                }
                operators.push(op);
            }
        }
    }

    while let Some(op) = operators.pop() {
        reduce(op, &mut operands, trace)?;
    }

    let result = match operands.as_slice() {
        [value] => Ok(*value),
        [] => Err(Reason::Empty.into()),
        rest => Err(Reason::Unbalanced(rest.len()).into()),
    };

    match &result {
        Ok(value) => debug!(expression, value, "evaluated"),
        Err(err) => debug!(expression, error = %err, "evaluation failed"),
    }
    result
}

fn reduce(
    op: Operator,
    operands: &mut Vec<f64>,
    trace: &mut EvaluationTrace,
) -> Result<(), EvalError> {
    // Right operand sits on top.
    let right = operands.pop().ok_or(Reason::MissingOperand(op))?;
    let left = operands.pop().ok_or(Reason::MissingOperand(op))?;
    let result = op.apply(left, right);

    trace!(%op, left, right, result, "applied operator");
    trace.add_step(format!("{} {} {}", left, op, right), result);
    operands.push(result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OPERATORS: [Operator; 5] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Pow,
    ];

    fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
        Scanner::new(input).collect()
    }

    fn eval(expr: &str) -> f64 {
        evaluate(expr).unwrap_or_else(|e| panic!("{expr:?} failed: {e}"))
    }

    #[test]
    fn test_precedence_table() {
        assert_eq!(Operator::Add.precedence(), 1);
        assert_eq!(Operator::Sub.precedence(), 1);
        assert_eq!(Operator::Mul.precedence(), 2);
        assert_eq!(Operator::Div.precedence(), 2);
        assert_eq!(Operator::Pow.precedence(), 3);
    }

    #[test]
    fn test_operator_symbols() {
        for op in ALL_OPERATORS {
            assert_eq!(Operator::from_char(op.symbol()), Some(op));
        }
        assert_eq!(Operator::from_char('%'), None);
        assert_eq!(Operator::from_char('('), None);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("12.5+3*4").unwrap(),
            vec![
                Token::Number(12.5),
                Token::Op(Operator::Add),
                Token::Number(3.0),
                Token::Op(Operator::Mul),
                Token::Number(4.0),
            ]
        );
        assert_eq!(tokenize("").unwrap(), vec![]);
        assert_eq!(
            tokenize(".5-5.").unwrap(),
            vec![Token::Number(0.5), Token::Op(Operator::Sub), Token::Number(5.0)]
        );
    }

    #[test]
    fn test_tokenize_rejects_bad_input() {
        assert!(tokenize("1.2.3").is_err());
        assert!(tokenize(".").is_err());
        assert!(tokenize("3 + 4").is_err());
        assert!(tokenize("3(4)").is_err());
        assert!(tokenize("2x").is_err());
    }

    #[test]
    fn test_scanner_stops_after_unknown_char() {
        let mut scanner = Scanner::new("1a+2");
        assert_eq!(scanner.next().unwrap().unwrap(), Token::Number(1.0));
        assert!(scanner.next().unwrap().is_err());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_single_number() {
        assert_eq!(eval("42"), 42.0);
        assert_eq!(eval("0.25"), 0.25);
    }

    #[test]
    fn test_multiplication_before_addition() {
        assert_eq!(eval("3+4*2"), 11.0);
        assert_eq!(eval("3*4+2"), 14.0);
        assert_eq!(eval("3+4*2^2"), 19.0);
    }

    #[test]
    fn test_power_is_left_associative() {
        assert_eq!(eval("2^3^2"), 64.0);
    }

    #[test]
    fn test_equal_precedence_left_to_right() {
        assert_eq!(eval("10-4-3"), 3.0);
        assert_eq!(eval("100/10/5"), 2.0);
        assert_eq!(eval("8/2*4"), 16.0);
        assert_eq!(eval("1-2+3"), 2.0);
    }

    #[test]
    fn test_power_binds_tighter_than_division() {
        assert_eq!(eval("16/2^3"), 2.0);
        assert_eq!(eval("2^3*2"), 16.0);
        assert_eq!(eval("1+2^2-3"), 2.0);
    }

    #[test]
    fn test_fractional_and_negative_exponents() {
        assert_eq!(eval("16^0.5"), 4.0);
        assert_eq!(eval("2^0-2"), -1.0);
        assert_eq!(eval("4^0.5^2"), 4.0);
    }

    #[test]
    fn test_division_by_zero_is_sentinel() {
        let value = evaluate("5/0").unwrap();
        assert!(is_division_by_zero(value));
        assert!(is_division_by_zero(evaluate("0/0").unwrap()));
        assert!(is_division_by_zero(evaluate("1+5/0").unwrap()));
    }

    #[test]
    fn test_percent_rewrite_result() {
        assert_eq!(eval("10/100"), 0.1);
        assert_eq!(eval("50*10/100"), 5.0);
    }

    #[test]
    fn test_negative_results() {
        assert_eq!(eval("3-8"), -5.0);
        assert_eq!(eval("2-3*4"), -10.0);
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(evaluate("").is_err());
        assert!(evaluate("+5").is_err());
        assert!(evaluate("5+").is_err());
        assert!(evaluate("5++3").is_err());
        assert!(evaluate("*").is_err());
        assert!(evaluate("1..2+3").is_err());
        assert!(evaluate("-5+1").is_err());
    }

    #[test]
    fn test_error_message_names_cause() {
        let err = evaluate("5+").unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed expression: operator '+' is missing an operand"
        );
        let err = evaluate("").unwrap_err();
        assert_eq!(err.to_string(), "malformed expression: empty expression");
    }

    #[test]
    fn test_trace_records_applications_in_order() {
        let mut trace = EvaluationTrace::new(true);
        let value = evaluate_traced("3+4*2", &mut trace).unwrap();
        assert_eq!(value, 11.0);
        let ops: Vec<&str> = trace.steps.iter().map(|s| s.operation.as_str()).collect();
        assert_eq!(ops, vec!["4 * 2", "3 + 8"]);
        assert_eq!(trace.steps[1].result, 11.0);
    }

    #[test]
    fn test_trace_disabled_records_nothing() {
        let mut trace = EvaluationTrace::new(false);
        evaluate_traced("1+2+3", &mut trace).unwrap();
        assert!(trace.steps.is_empty());
    }
}
