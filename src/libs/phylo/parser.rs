use super::error::TreeError;
use super::node::NodeId;
use super::tree::Tree;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{cut, map, opt},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, preceded},
    IResult, Offset, Parser,
};

type NomError<'a> = nom::error::Error<&'a str>;

/// Recursive intermediate form, flattened into the arena by `into_tree`.
#[derive(Debug, Default)]
struct ParsedNode {
    name: Option<String>,
    length: Option<f64>,
    children: Vec<ParsedNode>,
}

impl ParsedNode {
    fn into_tree(self, tree: &mut Tree) -> Result<NodeId, TreeError> {
        let id = tree.add_node();
        for child in self.children {
            let child_id = child.into_tree(tree)?;
            tree.add_child(id, child_id).map_err(TreeError::LogicError)?;
        }
        if let Some(node) = tree.get_node_mut(id) {
            node.name = self.name;
            node.length = self.length;
        }
        Ok(id)
    }
}

// Surrounding whitespace, newlines included, is insignificant.
fn ws<'a, F, O>(inner: F) -> impl Parser<&'a str, Output = O, Error = NomError<'a>>
where
    F: Parser<&'a str, Output = O, Error = NomError<'a>>,
{
    delimited(multispace0, inner, multispace0)
}

// Unquoted labels stop at structural characters and whitespace.
// Quoted labels use '' for an embedded quote.
fn parse_label(input: &str) -> IResult<&str, String> {
    let unquoted = map(
        take_while1(|c: char| !"():;,[]'".contains(c) && !c.is_whitespace()),
        |s: &str| s.to_string(),
    );
    let quoted = map(
        delimited(
            char('\''),
            many0(alt((
                map(is_not("'"), |s: &str| s.to_string()),
                map(tag("''"), |_| "'".to_string()),
            ))),
            char('\''),
        ),
        |parts: Vec<String>| parts.concat(),
    );

    alt((quoted, unquoted)).parse(input)
}

// Bracketed comments carry nothing we use.
fn skip_comments(input: &str) -> IResult<&str, ()> {
    map(
        many0(ws(delimited(char('['), take_while(|c| c != ']'), char(']')))),
        |_| (),
    )
    .parse(input)
}

fn parse_length(input: &str) -> IResult<&str, f64> {
    preceded(ws(char(':')), cut(ws(double))).parse(input)
}

// (child,child,...)label[comment]:length[comment]
fn parse_subtree(input: &str) -> IResult<&str, ParsedNode> {
    let (input, children) = opt(delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), parse_subtree),
        cut(ws(char(')'))),
    ))
    .parse(input)?;
    let (input, name) = opt(ws(parse_label)).parse(input)?;
    let (input, _) = skip_comments(input)?;
    let (input, length) = opt(parse_length).parse(input)?;
    let (input, _) = skip_comments(input)?;

    Ok((
        input,
        ParsedNode {
            name,
            length,
            children: children.unwrap_or_default(),
        },
    ))
}

/// Parses one tree terminated by `;`.
pub fn parse_newick(input: &str) -> Result<Tree, TreeError> {
    let mut parser = (ws(parse_subtree), ws(char(';')));

    match parser.parse(input) {
        Ok((_, (root_node, _))) => {
            let mut tree = Tree::new();
            let root_id = root_node.into_tree(&mut tree)?;
            tree.set_root(root_id);
            Ok(tree)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(make_tree_error(input, &e)),
        Err(nom::Err::Incomplete(_)) => Err(TreeError::ParseError {
            message: "Incomplete input".to_string(),
            line: 0,
            column: 0,
            snippet: String::new(),
        }),
    }
}

fn make_tree_error(input: &str, e: &NomError) -> TreeError {
    let offset = input.offset(e.input);
    let prefix = &input[..offset];
    let line = prefix.chars().filter(|&c| c == '\n').count() + 1;
    let last_newline = prefix.rfind('\n').map(|p| p + 1).unwrap_or(0);
    let column = offset - last_newline + 1;

    TreeError::ParseError {
        message: format!("unexpected input ({:?})", e.code),
        line,
        column,
        snippet: e.input.chars().take(50).collect(),
    }
}

impl Tree {
    /// Parse a Newick string into a Tree.
    ///
    /// ```
    /// use divmsa::libs::phylo::Tree;
    ///
    /// let tree = Tree::from_newick("((A:0.1,B:0.2):0.05,C:0.3);").unwrap();
    /// assert_eq!(tree.leaf_names(), vec!["A", "B", "C"]);
    ///
    /// assert!(Tree::from_newick("(A,B:x);").is_err());
    /// ```
    pub fn from_newick(input: &str) -> Result<Self, TreeError> {
        parse_newick(input)
    }
}
