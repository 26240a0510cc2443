use std::fmt::Debug;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
}

pub trait HasMeta {
    fn get_meta(&self) -> &Meta;
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierData {
    pub name: String,
    pub meta: Meta,
}

#[derive(Debug)]
pub struct ProgramData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
}

#[derive(Debug)]
pub enum ExpressionType {
    Literal(LiteralData),
    Identifier(IdentifierData),
    ThisExpression {
        meta: Meta,
    },
    ArrayExpression {
        meta: Meta,
        elements: Vec<ExpressionType>,
    },
    ObjectExpression {
        meta: Meta,
        properties: Vec<PropertyData>,
    },
    FunctionExpression(Rc<FunctionData>),
    ArrowFunctionExpression(Rc<FunctionData>),
    ClassExpression(Rc<ClassData>),
    UnaryExpression {
        meta: Meta,
        operator: UnaryOperator,
        argument: Box<ExpressionType>,
    },
    UpdateExpression {
        meta: Meta,
        operator: UpdateOperator,
        argument: Box<ExpressionType>,
        prefix: bool,
    },
    BinaryExpression {
        meta: Meta,
        operator: BinaryOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    LogicalExpression {
        meta: Meta,
        operator: LogicalOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    AssignmentExpression {
        meta: Meta,
        operator: AssignmentOperator,
        // Always an `Identifier` or a `MemberExpression`.
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    ConditionalExpression {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<ExpressionType>,
        alternate: Box<ExpressionType>,
    },
    CallExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    NewExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    MemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: MemberProperty,
    },
    SequenceExpression {
        meta: Meta,
        expressions: Vec<ExpressionType>,
    },
}

impl HasMeta for ExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            ExpressionType::Literal(data) => &data.meta,
            ExpressionType::Identifier(data) => &data.meta,
            ExpressionType::FunctionExpression(data)
            | ExpressionType::ArrowFunctionExpression(data) => &data.meta,
            ExpressionType::ClassExpression(data) => &data.meta,
            ExpressionType::ThisExpression { meta }
            | ExpressionType::ArrayExpression { meta, .. }
            | ExpressionType::ObjectExpression { meta, .. }
            | ExpressionType::UnaryExpression { meta, .. }
            | ExpressionType::UpdateExpression { meta, .. }
            | ExpressionType::BinaryExpression { meta, .. }
            | ExpressionType::LogicalExpression { meta, .. }
            | ExpressionType::AssignmentExpression { meta, .. }
            | ExpressionType::ConditionalExpression { meta, .. }
            | ExpressionType::CallExpression { meta, .. }
            | ExpressionType::NewExpression { meta, .. }
            | ExpressionType::MemberExpression { meta, .. }
            | ExpressionType::SequenceExpression { meta, .. } => meta,
        }
    }
}

#[derive(Debug)]
pub enum MemberProperty {
    Static(IdentifierData),
    Computed(Box<ExpressionType>),
}

#[derive(Debug)]
pub struct PropertyData {
    pub meta: Meta,
    pub key: PropertyKeyType,
    pub value: ExpressionType,
}

#[derive(Debug)]
pub enum PropertyKeyType {
    Static(String),
    Computed(Box<ExpressionType>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignmentOperator {
    Equals,
    AddEquals,
    SubtractEquals,
    MultiplyEquals,
    DivideEquals,
    ModuloEquals,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    LogicalNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOperator {
    PlusPlus,
    MinusMinus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    LooselyEqual,
    LooselyUnequal,
    StrictlyEqual,
    StrictlyUnequal,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    In,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOperator {
    Or,
    And,
    NullishCoalescing,
}

#[derive(Debug)]
pub struct LiteralData {
    pub meta: Meta,
    pub value: LiteralType,
}

#[derive(Debug, PartialEq)]
pub enum LiteralType {
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,
    NumberLiteral(NumberLiteralType),
}

#[derive(Debug, PartialEq)]
pub enum NumberLiteralType {
    IntegerLiteral(i64),
    FloatLiteral(f64),
}

#[derive(Debug)]
pub enum StatementType {
    EmptyStatement {
        meta: Meta,
    },
    ExpressionStatement {
        meta: Meta,
        expression: Box<ExpressionType>,
    },
    BlockStatement(BlockStatementData),
    VariableDeclaration(VariableDeclarationData),
    FunctionDeclaration(Rc<FunctionData>),
    ClassDeclaration(Rc<ClassData>),
    IfStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<StatementType>,
        alternate: Option<Box<StatementType>>,
    },
    WhileStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    DoWhileStatement {
        meta: Meta,
        body: Box<StatementType>,
        test: Box<ExpressionType>,
    },
    ForStatement {
        meta: Meta,
        init: Option<VariableDeclarationOrExpression>,
        test: Option<Box<ExpressionType>>,
        update: Option<Box<ExpressionType>>,
        body: Box<StatementType>,
    },
    ForInStatement {
        meta: Meta,
        left: ForInTarget,
        right: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    ReturnStatement {
        meta: Meta,
        argument: Option<Box<ExpressionType>>,
    },
    BreakStatement {
        meta: Meta,
    },
    ContinueStatement {
        meta: Meta,
    },
    ThrowStatement {
        meta: Meta,
        argument: Box<ExpressionType>,
    },
    TryStatement {
        meta: Meta,
        block: BlockStatementData,
        handler: Option<CatchClauseData>,
        finalizer: Option<BlockStatementData>,
    },
}

impl HasMeta for StatementType {
    fn get_meta(&self) -> &Meta {
        match self {
            StatementType::BlockStatement(data) => &data.meta,
            StatementType::VariableDeclaration(data) => &data.meta,
            StatementType::FunctionDeclaration(data) => &data.meta,
            StatementType::ClassDeclaration(data) => &data.meta,
            StatementType::EmptyStatement { meta }
            | StatementType::ExpressionStatement { meta, .. }
            | StatementType::IfStatement { meta, .. }
            | StatementType::WhileStatement { meta, .. }
            | StatementType::DoWhileStatement { meta, .. }
            | StatementType::ForStatement { meta, .. }
            | StatementType::ForInStatement { meta, .. }
            | StatementType::ReturnStatement { meta, .. }
            | StatementType::BreakStatement { meta }
            | StatementType::ContinueStatement { meta }
            | StatementType::ThrowStatement { meta, .. }
            | StatementType::TryStatement { meta, .. } => meta,
        }
    }
}

#[derive(Debug)]
pub struct BlockStatementData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableDeclarationKind {
    Var,
    Let,
    Const,
}

#[derive(Debug)]
pub struct VariableDeclarationData {
    pub meta: Meta,
    pub kind: VariableDeclarationKind,
    pub declarations: Vec<VariableDeclaratorData>,
}

#[derive(Debug)]
pub struct VariableDeclaratorData {
    pub meta: Meta,
    pub id: IdentifierData,
    pub init: Option<Box<ExpressionType>>,
}

#[derive(Debug)]
pub enum VariableDeclarationOrExpression {
    VariableDeclaration(VariableDeclarationData),
    Expression(Box<ExpressionType>),
}

#[derive(Debug)]
pub struct ForInTarget {
    pub kind: Option<VariableDeclarationKind>,
    pub id: IdentifierData,
}

#[derive(Debug)]
pub struct CatchClauseData {
    pub meta: Meta,
    pub param: Option<IdentifierData>,
    pub body: BlockStatementData,
}

#[derive(Debug)]
pub enum FunctionBodyType {
    Block(Vec<StatementType>),
    Expression(Box<ExpressionType>),
}

#[derive(Debug)]
pub struct FunctionData {
    pub meta: Meta,
    pub id: Option<IdentifierData>,
    pub params: Vec<IdentifierData>,
    pub body: FunctionBodyType,
    pub is_arrow: bool,
    /// Exact source text of the function, as returned by `Function.prototype.toString`.
    pub source: String,
}

impl FunctionData {
    pub fn name(&self) -> &str {
        self.id.as_ref().map(|id| id.name.as_str()).unwrap_or("")
    }
}

#[derive(Debug)]
pub struct ClassData {
    pub meta: Meta,
    pub id: Option<IdentifierData>,
    pub constructor: Option<Rc<FunctionData>>,
    pub methods: Vec<ClassMethodData>,
    pub source: String,
}

impl ClassData {
    pub fn name(&self) -> &str {
        self.id.as_ref().map(|id| id.name.as_str()).unwrap_or("")
    }
}

#[derive(Debug)]
pub struct ClassMethodData {
    pub key: String,
    pub is_static: bool,
    pub function: Rc<FunctionData>,
}
