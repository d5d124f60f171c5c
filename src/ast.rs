use derive_more::From;

use crate::token::Op;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintStmt {
    pub expression: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputStmt {
    pub variable: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub consequent: Vec<Stmt>,
    pub alternate: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, From)]
pub enum Stmt {
    VarDecl(VarDecl),
    Print(PrintStmt),
    Input(InputStmt),
    If(IfStmt),
    While(WhileStmt),
    Function(FunDecl),
    Return(ReturnStmt),
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: Op,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: Op,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: String,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, From)]
pub enum Expr {
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Call(CallExpr),
    #[from(ignore)]
    Identifier(String),
    #[from(ignore)]
    NumberLit(f64),
    #[from(ignore)]
    StringLit(String),
}
