use super::*;

#[test]
fn it_keeps_fragments_in_append_order() {
    let mut log = OutputLog::new();
    log.append(OutputKind::Stdout, "a");
    log.append(OutputKind::Stderr, "b\n");
    log.append(OutputKind::Prompt, "name? ");
    log.append(OutputKind::Echo, "bob\n");
    log.append(OutputKind::Stdout, "c");

    let kinds = log
        .fragments()
        .iter()
        .map(|fragment| fragment.kind)
        .collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            OutputKind::Stdout,
            OutputKind::Stderr,
            OutputKind::Prompt,
            OutputKind::Echo,
            OutputKind::Stdout
        ]
    );
    assert_eq!(log.text(), format!("a{ERROR_TAG}b\nname? bob\nc"));
}

#[test]
fn it_stores_stderr_text_verbatim() {
    let mut log = OutputLog::new();
    log.append(OutputKind::Stderr, "  spaced\ttext  ");

    assert_eq!(log.fragments()[0].text, "  spaced\ttext  ");
}

#[test]
fn it_ignores_empty_appends() {
    let mut log = OutputLog::new();
    log.append(OutputKind::Stdout, "");

    assert!(log.is_empty());
}

#[test]
fn it_clears_idempotently() {
    let mut log = OutputLog::new();
    log.clear();
    assert!(log.is_empty());
    assert_eq!(log.text(), "");

    log.append(OutputKind::Status, "hello\n");
    log.clear();
    log.clear();
    assert!(log.is_empty());
}

#[test]
fn it_renders_since_a_mark() {
    let mut log = OutputLog::new();
    log.append(OutputKind::Status, "Loading\n");
    let mark = log.len();
    log.append(OutputKind::Status, "Running\n");
    log.append(OutputKind::Stdout, "1\n");
    log.append(OutputKind::Warning, "careful\n");

    assert_eq!(log.since(mark), format!("Running\n1\n{WARNING_TAG}careful\n"));
    assert_eq!(log.program_output_since(mark), "1\n");
}
