//! Walks an attribute value through speculative parsing.
//!
//! Tries to read `href="..."` as a URL and falls back to plain text when the
//! value turns out to be something else, then prints the resulting tree.
//!
//! Run with: RUST_LOG=trace cargo run --example speculate

use autoesc_core::{
    symbols, BinaryOutput, Marker, Output, OutputLog, OutputTree, ProdName, RawCursor, Side,
    Transform, Variable,
};

symbols! {
    /// What an attribute value holds.
    pub enum AttrT { Plain, Url }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let attr = Variable::<AttrT>::new("attr")?;
    let tag = ProdName::new("Tag")?;

    let input = RawCursor::new("\"mailto:a%20b\">");
    let log = OutputLog::new()
        .append(BinaryOutput::boundary(Side::Left, tag.clone()))
        .append(Output::text("<a href="))
        .append(attr.scope(Side::Left));

    // First alternative: an http URL.
    let attempt = log.push_marker(Marker::Branch).append(attr.value(AttrT::Url));
    let (attempt, rest) = match input.consume_prefix("\"") {
        Some(rest) => (attempt.append(Output::text("\"")), rest),
        None => (attempt, input.clone()),
    };
    let (log, input) = if rest.remaining().starts_with("http") {
        (attempt.commit(Marker::Branch)?, rest)
    } else {
        println!("not http, rolling back {}", attempt);
        attempt.rollback(Marker::Branch, &rest)?
    };
    println!("input after rollback: {}", input);

    // Second alternative: anything up to the closing quote, kept as plain text
    // with its percent escapes decoded.
    let log = log.append(attr.value(AttrT::Plain));
    let quoted = input.remaining().split('"').nth(1).unwrap_or_default();
    let log = log
        .append(Output::text("\""))
        .append(BinaryOutput::embed(Side::Left, Transform::UriPath))
        .append(Output::string(&quoted.replace("%20", " "), quoted))
        .append(BinaryOutput::embed(Side::Right, Transform::UriPath))
        .append(Output::text("\""))
        .append(attr.scope(Side::Right))
        .append(Output::text(">"))
        .append(BinaryOutput::boundary(Side::Right, tag));

    println!("{}", log);
    println!("{}", OutputTree::build(&log)?.dump());
    Ok(())
}
