use divesim::command::*;
use std::collections::VecDeque;

#[test]
fn test_parse_quit() {
    assert_eq!(parse("quit"), OperatorCommand::Quit);
    assert_eq!(parse("  QUIT \n"), OperatorCommand::Quit);
}

#[test]
fn test_parse_set_depth() {
    assert_eq!(parse("SET DEPTH 30"), OperatorCommand::SetDepth(30.0));
    assert_eq!(parse("set depth 12.5"), OperatorCommand::SetDepth(12.5));
    assert_eq!(parse("\tset   depth\t0 "), OperatorCommand::SetDepth(0.0));
}

#[test]
fn test_parse_set_rate_converts_to_metres_per_second() {
    assert_eq!(parse("set rate 12"), OperatorCommand::SetRate(0.2));
    assert_eq!(parse("Set Rate 18"), OperatorCommand::SetRate(0.3));
    assert_eq!(parse("set rate -9"), OperatorCommand::SetRate(0.15));
    assert_eq!(parse("set rate 0"), OperatorCommand::SetRate(0.0));
}

#[test]
fn test_parse_rejects_unknown_commands() {
    assert_eq!(parse(""), OperatorCommand::Malformed);
    assert_eq!(parse("   "), OperatorCommand::Malformed);
    assert_eq!(parse("exit"), OperatorCommand::Malformed);
    assert_eq!(parse("set"), OperatorCommand::Malformed);
    assert_eq!(parse("set depth"), OperatorCommand::Malformed);
    assert_eq!(parse("set speed 10"), OperatorCommand::Malformed);
    assert_eq!(parse("quit now"), OperatorCommand::Malformed);
    assert_eq!(parse("set depth 10 20"), OperatorCommand::Malformed);
}

#[test]
fn test_parse_rejects_bad_numbers() {
    assert_eq!(parse("set depth deep"), OperatorCommand::Malformed);
    assert_eq!(parse("set rate 1,5"), OperatorCommand::Malformed);
    assert_eq!(parse("set depth nan"), OperatorCommand::Malformed);
    assert_eq!(parse("set depth inf"), OperatorCommand::Malformed);
    assert_eq!(parse("set rate -infinity"), OperatorCommand::Malformed);
}

#[test]
fn test_queue_source_yields_lines_in_order() {
    let mut source: VecDeque<String> = VecDeque::new();
    source.push_back("set depth 10".to_string());
    source.push_back("quit".to_string());

    assert_eq!(source.poll_line().as_deref(), Some("set depth 10"));
    assert_eq!(source.poll_line().as_deref(), Some("quit"));
    assert_eq!(source.poll_line(), None);
}

#[test]
fn test_no_input_never_blocks() {
    let mut source = NoInput;
    assert_eq!(source.poll_line(), None);
}

#[tokio::test]
async fn test_channel_source_is_non_blocking() {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(4);

    assert_eq!(rx.poll_line(), None);

    tx.send("set rate 6".to_string()).await.unwrap();
    assert_eq!(rx.poll_line().as_deref(), Some("set rate 6"));
    assert_eq!(rx.poll_line(), None);
}
