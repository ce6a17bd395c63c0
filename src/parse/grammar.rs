use winnow::ascii::{digit1, till_line_ending};
use winnow::combinator::{alt, cut_err, delimited, not, opt, preceded, repeat, separated, terminated};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use super::parser::{
    AtomNode, CallNode, ConstantNode, ExpressionNode, LiteralNode, ParseTree, PredicateNode,
    RuleNode, StatementNode, TermNode,
};

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
            ("//", till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

// -- Identifiers & keywords -------------------------------------------------

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1, |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_ident_char),
    )
        .take()
        .parse_next(input)
}

fn path_tail(input: &mut &str) -> ModalResult<()> {
    repeat(0.., ('.', ident).void()).parse_next(input)
}

fn dotted_path<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (ident, path_tail).take().parse_next(input)
}

fn keyword<'i>(word: &'static str) -> impl Parser<&'i str, &'i str, ErrMode<ContextError>> {
    terminated(word, not(take_while(1, is_ident_char)))
}

// -- Literals ---------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn number(input: &mut &str) -> ModalResult<ConstantNode> {
    let text = (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .parse_next(input)?;
    not(take_while(1, is_ident_char)).parse_next(input)?;
    let literal = if text.contains('.') {
        LiteralNode::Real
    } else {
        LiteralNode::Decimal(text.trim_start_matches('-').to_owned())
    };
    Ok(ConstantNode {
        text: text.to_owned(),
        literal,
    })
}

fn signed_integer<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (opt('-'), digit1).take().parse_next(input)
}

// -- Value atoms (precedence: additive < multiplicative < primary) ----------

fn primary(input: &mut &str) -> ModalResult<AtomNode> {
    ws.parse_next(input)?;
    alt((
        delimited(('(', ws), atom, (ws, ')')),
        string_literal.map(|s| AtomNode::Constant(ConstantNode::string(s))),
        number.map(AtomNode::Constant),
        path_atom,
    ))
    .context(expected("value"))
    .parse_next(input)
}

fn path_atom(input: &mut &str) -> ModalResult<AtomNode> {
    let path = dotted_path.parse_next(input)?;
    let checkpoint = input.checkpoint();
    ws.parse_next(input)?;
    if opt('(').parse_next(input)?.is_some() {
        let args = cut_err(call_args).parse_next(input)?;
        return Ok(AtomNode::Call(CallNode {
            path: path.to_owned(),
            args,
        }));
    }
    input.reset(&checkpoint);

    if path.eq_ignore_ascii_case("true") || path.eq_ignore_ascii_case("false") {
        return Ok(AtomNode::Constant(ConstantNode::boolean(path)));
    }
    match path {
        "null" => Ok(AtomNode::Constant(ConstantNode::null(false))),
        "not" => {
            ws.parse_next(input)?;
            cut_err(keyword("null"))
                .context(expected("`null` after `not`"))
                .parse_next(input)?;
            Ok(AtomNode::Constant(ConstantNode::null(true)))
        }
        _ => Ok(AtomNode::Variable(path.to_owned())),
    }
}

fn call_args(input: &mut &str) -> ModalResult<Vec<AtomNode>> {
    ws.parse_next(input)?;
    if opt(')').parse_next(input)?.is_some() {
        return Ok(Vec::new());
    }
    let args: Vec<AtomNode> = separated(1.., atom, (ws, ',')).parse_next(input)?;
    (ws, ')').context(expected("`)`")).parse_next(input)?;
    Ok(args)
}

fn fold_math(first: AtomNode, rest: Vec<(&str, AtomNode)>) -> AtomNode {
    rest.into_iter().fold(first, |acc, (op, rhs)| {
        AtomNode::Math(Box::new(acc), op.to_owned(), Box::new(rhs))
    })
}

fn term(input: &mut &str) -> ModalResult<AtomNode> {
    let first = primary(input)?;
    let rest: Vec<(&str, AtomNode)> = repeat(
        0..,
        (preceded(ws, alt(("*", "/"))), cut_err(primary)),
    )
    .parse_next(input)?;
    Ok(fold_math(first, rest))
}

fn atom(input: &mut &str) -> ModalResult<AtomNode> {
    let first = term(input)?;
    let rest: Vec<(&str, AtomNode)> =
        repeat(0.., (preceded(ws, alt(("+", "-"))), cut_err(term))).parse_next(input)?;
    Ok(fold_math(first, rest))
}

// -- Conditions -------------------------------------------------------------

fn compare_op<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((">=", "<=", "==", "!=", ">", "<")).parse_next(input)
}

fn predicate(input: &mut &str) -> ModalResult<PredicateNode> {
    let left = atom(input)?;
    let checkpoint = input.checkpoint();
    ws.parse_next(input)?;
    if let Some(op) = opt(compare_op).parse_next(input)? {
        let right = cut_err(atom).parse_next(input)?;
        return Ok(PredicateNode {
            left,
            comparison: Some((op.to_owned(), right)),
        });
    }
    input.reset(&checkpoint);
    Ok(PredicateNode {
        left,
        comparison: None,
    })
}

/// A parenthesised sub-expression. When a comparison or math operator follows
/// the closing parenthesis the parentheses belong to an atom instead.
fn group(input: &mut &str) -> ModalResult<ExpressionNode> {
    let inner = delimited(('(', ws), expression, (ws, ')')).parse_next(input)?;
    not((ws, alt(("==", "!=", "<", ">", "+", "-", "*", "/")))).parse_next(input)?;
    Ok(inner)
}

fn condition_term(input: &mut &str) -> ModalResult<TermNode> {
    ws.parse_next(input)?;
    alt((
        group.map(|e| TermNode::Group(Box::new(e))),
        predicate.map(TermNode::Predicate),
    ))
    .context(expected("condition"))
    .parse_next(input)
}

fn logical_op<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt(("&&", "||")).parse_next(input)
}

fn expression(input: &mut &str) -> ModalResult<ExpressionNode> {
    let head = condition_term(input)?;
    let tail: Vec<(&str, TermNode)> = repeat(
        0..,
        (preceded(ws, logical_op), cut_err(condition_term)),
    )
    .parse_next(input)?;
    Ok(ExpressionNode {
        head,
        tail: tail
            .into_iter()
            .map(|(op, term)| (op.to_owned(), term))
            .collect(),
    })
}

// -- Actions ----------------------------------------------------------------

fn assignment(input: &mut &str) -> ModalResult<StatementNode> {
    ws.parse_next(input)?;
    let target = dotted_path.parse_next(input)?;
    ws.parse_next(input)?;
    ('=', not('=')).parse_next(input)?;
    let source = cut_err(atom).parse_next(input)?;
    (ws, cut_err(';'))
        .context(expected("`;`"))
        .parse_next(input)?;
    Ok(StatementNode::Assign {
        target: target.to_owned(),
        source,
    })
}

fn call_statement(input: &mut &str) -> ModalResult<StatementNode> {
    ws.parse_next(input)?;
    let path = dotted_path.parse_next(input)?;
    (ws, '(').parse_next(input)?;
    let args = cut_err(call_args).parse_next(input)?;
    (ws, cut_err(';'))
        .context(expected("`;`"))
        .parse_next(input)?;
    Ok(StatementNode::Call(CallNode {
        path: path.to_owned(),
        args,
    }))
}

fn statement(input: &mut &str) -> ModalResult<StatementNode> {
    alt((assignment, call_statement)).parse_next(input)
}

// -- Rule definitions -------------------------------------------------------

fn rule_name(input: &mut &str) -> ModalResult<String> {
    alt((string_literal, ident.map(str::to_owned))).parse_next(input)
}

fn salience(input: &mut &str) -> ModalResult<String> {
    preceded(
        (keyword("salience"), ws),
        cut_err(signed_integer).context(expected("salience value")),
    )
    .map(str::to_owned)
    .parse_next(input)
}

fn rule_def(input: &mut &str) -> ModalResult<RuleNode> {
    ws.parse_next(input)?;
    keyword("rule").parse_next(input)?;
    ws.parse_next(input)?;

    let name = cut_err(rule_name)
        .context(expected("rule name"))
        .parse_next(input)?;
    ws.parse_next(input)?;
    let description = opt(string_literal).parse_next(input)?.unwrap_or_default();
    ws.parse_next(input)?;
    let salience = opt(salience).parse_next(input)?;
    ws.parse_next(input)?;

    cut_err(keyword("when"))
        .context(expected("`when`"))
        .parse_next(input)?;
    let when = cut_err(expression)
        .context(expected("rule condition"))
        .parse_next(input)?;
    ws.parse_next(input)?;
    cut_err(keyword("then"))
        .context(expected("`then`"))
        .parse_next(input)?;
    let then: Vec<StatementNode> = cut_err(repeat(1.., statement))
        .context(expected("rule action"))
        .parse_next(input)?;
    ws.parse_next(input)?;
    cut_err(keyword("end"))
        .context(expected("`end`"))
        .parse_next(input)?;

    Ok(RuleNode {
        name,
        description,
        salience,
        when,
        then,
    })
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_ruleset(input: &mut &str) -> ModalResult<ParseTree> {
    let rules: Vec<RuleNode> = repeat(0.., rule_def).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(ParseTree { rules })
}
