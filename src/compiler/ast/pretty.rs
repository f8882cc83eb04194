/*!
Renders an AST back into Grace source text.

Used with the AST-only build mode for dump debugging; printing is a fixed
point under re-parsing (print → parse → print yields the same text), which
the parser tests lean on.
*/
use super::{
    BinaryOp, Block, Condition, DataType, Dim, Expression, FuncHeader, FunctionDef, LValue,
    LValueKind, LocalDef, PassMode, Program, Statement, UnaryOp,
};

pub fn program_to_source(program: &Program) -> String {
    let mut p = Printer::new();
    p.function(&program.main);
    p.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Printer {
        Printer {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn function(&mut self, def: &FunctionDef) {
        self.line(&header_to_string(&def.header));
        for local in &def.locals {
            match local {
                LocalDef::Var(v) => {
                    self.line(&format!("var {} : {};", v.name, type_to_string(&v.ty)))
                }
                LocalDef::Decl(h) => self.line(&format!("{};", header_to_string(h))),
                LocalDef::Func(f) => self.function(f),
            }
        }
        self.block(&def.body);
    }

    fn block(&mut self, block: &Block) {
        self.line("{");
        self.indent += 1;
        for stmt in &block.statements {
            self.statement(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Empty(_) => self.line(";"),
            Statement::Assign { target, value, .. } => self.line(&format!(
                "{} <- {};",
                lvalue_to_string(target),
                expr_to_string(value)
            )),
            Statement::Block(b) => self.block(b),
            Statement::Call(call) => self.line(&format!("{};", call_to_string(call))),
            Statement::If {
                cond,
                then_stmt,
                else_stmt,
                ..
            } => {
                self.line(&format!("if {} then", cond_to_string(cond)));
                self.indent += 1;
                self.statement(then_stmt);
                self.indent -= 1;
                if let Some(els) = else_stmt {
                    self.line("else");
                    self.indent += 1;
                    self.statement(els);
                    self.indent -= 1;
                }
            }
            Statement::While { cond, body, .. } => {
                self.line(&format!("while {} do", cond_to_string(cond)));
                self.indent += 1;
                self.statement(body);
                self.indent -= 1;
            }
            Statement::Return { value, .. } => match value {
                Some(e) => self.line(&format!("return {};", expr_to_string(e))),
                None => self.line("return;"),
            },
        }
    }
}

fn header_to_string(h: &FuncHeader) -> String {
    let params: Vec<String> = h
        .params
        .iter()
        .map(|p| {
            let r = match p.mode {
                PassMode::ByReference => "ref ",
                PassMode::ByValue => "",
            };
            format!("{}{} : {}", r, p.name, type_to_string(&p.ty))
        })
        .collect();
    format!("fun {}({}) : {}", h.name, params.join("; "), h.ret)
}

fn type_to_string(ty: &DataType) -> String {
    match ty {
        DataType::Scalar(k) => format!("{}", k),
        DataType::Array { elem, dims } => {
            let mut s = format!("{}", elem);
            for d in dims {
                match d {
                    Dim::Unspecified => s.push_str("[]"),
                    Dim::Fixed(n) => s.push_str(&format!("[{}]", n)),
                }
            }
            s
        }
    }
}

fn lvalue_to_string(lv: &LValue) -> String {
    match &lv.kind {
        LValueKind::Ident(id) => id.clone(),
        LValueKind::StringLit(bytes) => {
            let mut s = String::from("\"");
            for b in bytes {
                s.push_str(&escape_byte(*b, b'"'));
            }
            s.push('"');
            s
        }
        LValueKind::Index { base, indices } => {
            let mut s = lvalue_to_string(base);
            for ix in indices {
                s.push_str(&format!("[{}]", expr_to_string(ix)));
            }
            s
        }
    }
}

fn escape_byte(b: u8, quote: u8) -> String {
    match b {
        b'\n' => "\\n".into(),
        b'\t' => "\\t".into(),
        b'\r' => "\\r".into(),
        0 => "\\0".into(),
        b'\\' => "\\\\".into(),
        _ if b == quote => format!("\\{}", quote as char),
        0x20..=0x7e => (b as char).to_string(),
        _ => format!("\\x{:02x}", b),
    }
}

fn call_to_string(call: &super::FunctionCall) -> String {
    let args: Vec<String> = call.args.iter().map(expr_to_string).collect();
    format!("{}({})", call.name, args.join(", "))
}

fn expr_to_string(e: &Expression) -> String {
    match e {
        Expression::IntLit(v, _) => format!("{}", v),
        Expression::CharLit(b, _) => format!("'{}'", escape_byte(*b, b'\'')),
        Expression::LValue(lv) => lvalue_to_string(lv),
        Expression::Call(call) => call_to_string(call),
        Expression::Unary { op, operand, .. } => {
            let sign = match op {
                UnaryOp::Plus => "+",
                UnaryOp::Minus => "-",
            };
            format!("({}{})", sign, expr_to_string(operand))
        }
        Expression::Binary {
            op, left, right, ..
        } => {
            let sym = match op {
                BinaryOp::Add => "+",
                BinaryOp::Sub => "-",
                BinaryOp::Mul => "*",
                BinaryOp::Div => "div",
                BinaryOp::Mod => "mod",
            };
            format!(
                "({} {} {})",
                expr_to_string(left),
                sym,
                expr_to_string(right)
            )
        }
    }
}

fn cond_to_string(c: &Condition) -> String {
    match c {
        Condition::Compare {
            op, left, right, ..
        } => format!(
            "{} {} {}",
            expr_to_string(left),
            op,
            expr_to_string(right)
        ),
        Condition::Logic {
            op, left, right, ..
        } => format!(
            "({}) {} ({})",
            cond_to_string(left),
            op,
            cond_to_string(right)
        ),
        Condition::Not { operand, .. } => format!("not ({})", cond_to_string(operand)),
    }
}
