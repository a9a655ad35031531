use super::*;

fn traced_report() -> Result<ReportPage> {
    let mut page = report()?;
    page.set_trace_stderr(false);
    page.enable_trace(true);
    Ok(page)
}

#[test]
fn enabling_trace_records_the_built_tree() -> Result<()> {
    let mut page = traced_report()?;
    assert_eq!(
        page.take_trace_logs(),
        vec![
            "[tree] version #v1 open children=2",
            "[tree]   section #v1-s1 open children=2",
            "[tree]     section #v1-s1-a leaf children=0",
            "[tree]     section #v1-s1-b open children=1",
            "[tree]       section #v1-s1-b-x leaf children=0",
            "[tree]   section #v1-s2 leaf children=0",
            "[tree] inert #v1-s1-a reason=leaf",
            "[tree] inert #v1-s1-b-x reason=leaf",
            "[tree] inert #v1-s2 reason=leaf",
        ]
    );
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn clicks_log_each_listener_and_the_dispatch_summary() -> Result<()> {
    let mut page = traced_report()?;
    page.take_trace_logs();

    page.click("#v1-s1")?;
    page.click("#v1-s1-icon")?;
    page.click("#v1-s2")?;
    assert_eq!(
        page.take_trace_logs(),
        vec![
            "[event] click current=#v1-s1 -> close",
            "[event] done click target=#v1-s1 handled=1",
            "[event] click current=#v1-s1 -> open",
            "[event] done click target=#v1-s1-icon handled=1",
            "[event] done click target=#v1-s2 handled=0",
        ]
    );
    Ok(())
}

#[test]
fn other_event_types_reach_no_listener() -> Result<()> {
    let mut page = traced_report()?;
    page.take_trace_logs();
    page.dispatch("#v1-s1", "mouseover")?;
    page.assert_visible("#v1-s1-sub")?;
    assert_eq!(
        page.take_trace_logs(),
        vec!["[event] done mouseover target=#v1-s1 handled=0"]
    );
    Ok(())
}

#[test]
fn direct_toggles_log_as_tree_lines_even_without_event_lines() -> Result<()> {
    let mut page = traced_report()?;
    page.take_trace_logs();
    page.set_trace_events(false);

    assert_eq!(page.toggle("v1")?, Some(Direction::Close));
    page.click("#v1 .handler")?;
    assert_eq!(page.toggle("v1-s2")?, None);
    assert_eq!(page.take_trace_logs(), vec!["[tree] close #v1"]);
    page.assert_visible("#v1-table")?;
    Ok(())
}

#[test]
fn nothing_is_logged_while_trace_is_off() -> Result<()> {
    let mut page = report()?;
    page.click("#v1-s1")?;
    page.toggle("v1")?;
    assert!(page.take_trace_logs().is_empty());

    page.set_trace_stderr(false);
    page.enable_trace(true);
    page.enable_trace(false);
    page.take_trace_logs();
    page.click("#v1-s1")?;
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn log_limit_keeps_the_newest_entries() -> Result<()> {
    let mut page = traced_report()?;
    page.set_trace_log_limit(2)?;
    assert_eq!(
        page.take_trace_logs(),
        vec![
            "[tree] inert #v1-s1-b-x reason=leaf",
            "[tree] inert #v1-s2 reason=leaf",
        ]
    );

    page.click("#v1-s1")?;
    page.toggle("v1")?;
    assert_eq!(
        page.take_trace_logs(),
        vec!["[event] done click target=#v1-s1 handled=1", "[tree] close #v1"]
    );
    Ok(())
}

#[test]
fn zero_log_limit_is_rejected() -> Result<()> {
    let mut page = traced_report()?;
    assert_eq!(
        page.set_trace_log_limit(0),
        Err(Error::InvalidConfig(
            "set_trace_log_limit requires at least 1 entry".into()
        ))
    );
    assert_eq!(page.take_trace_logs().len(), 9);
    Ok(())
}

#[test]
fn inert_containers_are_listed_with_reasons() -> Result<()> {
    let html = r#"
        <div class="version"><img class="handler"><table></table></div>
        <div class="version" id="nohandler"><table></table></div>
        <div class="version" id="notable"><img class="handler"></div>
        "#;
    let mut page = ReportPage::from_html(html)?;
    page.set_trace_stderr(false);
    page.enable_trace(true);
    assert_eq!(
        page.take_trace_logs(),
        vec![
            "[tree] inert div reason=missing-id",
            "[tree] inert #nohandler reason=missing-handler",
            "[tree] inert #notable reason=missing-table",
        ]
    );
    assert!(page.versions().is_empty());
    Ok(())
}
