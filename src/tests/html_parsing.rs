use super::*;

#[test]
fn omitted_row_and_cell_end_tags_are_implied() -> Result<()> {
    let dom = parse_html(
        "<table id=t><tr id=a class=parent-v-0><td>one<td>two<tr id=b class=parent-v-0><td>three</table>",
    )?;
    let a = dom.by_id("a").ok_or(Error::SelectorNotFound("#a".into()))?;
    let b = dom.by_id("b").ok_or(Error::SelectorNotFound("#b".into()))?;
    assert_eq!(dom.next_element_sibling(a), Some(b));
    assert_eq!(dom.query_selector_all("#a > td")?.len(), 2);
    assert_eq!(dom.text_content(a), "onetwo");
    Ok(())
}

#[test]
fn nested_tables_keep_their_own_rows() -> Result<()> {
    let dom = parse_html(
        "<table><tr id=outer><td><table><tr id=inner><td>x</table></td><tr id=after></table>",
    )?;
    let outer = dom.by_id("outer").ok_or(Error::SelectorNotFound("#outer".into()))?;
    let after = dom.by_id("after").ok_or(Error::SelectorNotFound("#after".into()))?;
    assert_eq!(dom.next_element_sibling(outer), Some(after));
    assert!(dom.query_selector("#outer #inner")?.is_some());
    Ok(())
}

#[test]
fn comments_and_doctype_are_skipped() -> Result<()> {
    let dom = parse_html("<!DOCTYPE html><!-- generated --><p id=p>text<!-- x --></p>")?;
    assert_eq!(dom.dump_node(dom.root), r#"<p id="p">text</p>"#);
    Ok(())
}

#[test]
fn unclosed_comment_is_an_error() {
    assert_eq!(
        parse_html("<p>a<!-- never closed").err(),
        Some(Error::HtmlParse("unclosed HTML comment".into()))
    );
}

#[test]
fn character_references_are_decoded_in_text_and_attributes() -> Result<()> {
    let dom = parse_html(r#"<td id="x" title="a &amp; b">&lt;3 &#x41;&#66; &bogus; &nbsp;</td>"#)?;
    let td = dom.by_id("x").ok_or(Error::SelectorNotFound("#x".into()))?;
    assert_eq!(dom.attr(td, "title").as_deref(), Some("a & b"));
    assert_eq!(dom.text_content(td), "<3 AB &bogus; \u{00A0}");
    Ok(())
}

#[test]
fn serialization_escapes_text_and_attributes() -> Result<()> {
    let dom = parse_html(r#"<span title='say "hi"'>a &lt; b &amp; c</span>"#)?;
    assert_eq!(
        dom.dump_node(dom.root),
        r#"<span title="say &quot;hi&quot;">a &lt; b &amp; c</span>"#
    );
    Ok(())
}

#[test]
fn first_duplicate_attribute_wins_and_names_lowercase() -> Result<()> {
    let dom = parse_html(r#"<TR ID="first" id="second" Class="Version" hidden></TR>"#)?;
    let row = dom.by_id("first").ok_or(Error::SelectorNotFound("#first".into()))?;
    assert_eq!(dom.by_id("second"), None);
    assert_eq!(dom.tag_name(row), Some("tr"));
    assert_eq!(dom.attr(row, "class").as_deref(), Some("Version"));
    assert_eq!(dom.attr(row, "hidden").as_deref(), Some(""));
    Ok(())
}

#[test]
fn void_and_self_closing_tags_take_no_children() -> Result<()> {
    let dom = parse_html(r#"<td id=c><img class=handler src=a.png><br/><span/>tail</td>"#)?;
    assert_eq!(
        dom.dump_node(dom.root),
        r#"<td id="c"><img class="handler" src="a.png"><br><span></span>tail</td>"#
    );
    Ok(())
}

#[test]
fn stray_end_tags_and_lone_angle_brackets_are_tolerated() -> Result<()> {
    let dom = parse_html("<div id=d>1 < 2</span></div>")?;
    let div = dom.by_id("d").ok_or(Error::SelectorNotFound("#d".into()))?;
    assert_eq!(dom.text_content(div), "1 < 2");
    Ok(())
}

#[test]
fn script_bodies_are_raw_text() -> Result<()> {
    let dom = parse_html("<script>if (a<b) { init('<tr>'); }</script><p id=p></p>")?;
    assert!(dom.query_selector("tr")?.is_none());
    assert!(dom.query_selector("#p")?.is_some());
    Ok(())
}

#[test]
fn unclosed_start_tag_is_an_error() {
    assert!(matches!(
        parse_html(r#"<tr class="version""#),
        Err(Error::HtmlParse(_))
    ));
}

#[test]
fn class_edits_keep_attribute_order_and_an_emptied_class() -> Result<()> {
    let mut dom = parse_html(r#"<table id=t class="hidden" data-v=1></table>"#)?;
    let table = dom.by_id("t").ok_or(Error::SelectorNotFound("#t".into()))?;
    dom.class_add(table, "results")?;
    dom.class_add(table, "results")?;
    assert_eq!(
        dom.dump_node(table),
        r#"<table id="t" class="hidden results" data-v="1"></table>"#
    );
    dom.class_remove(table, "hidden")?;
    dom.class_remove(table, "results")?;
    assert_eq!(
        dom.dump_node(table),
        r#"<table id="t" class="" data-v="1"></table>"#
    );
    Ok(())
}

#[test]
fn a_class_attribute_created_by_an_edit_goes_away_when_emptied() -> Result<()> {
    let mut dom = parse_html(r#"<table id="t" data-v="1"></table>"#)?;
    let table = dom.by_id("t").ok_or(Error::SelectorNotFound("#t".into()))?;
    dom.class_add(table, "hidden")?;
    assert_eq!(
        dom.dump_node(table),
        r#"<table id="t" data-v="1" class="hidden"></table>"#
    );
    dom.class_remove(table, "hidden")?;
    assert_eq!(dom.dump_node(table), r#"<table id="t" data-v="1"></table>"#);

    dom.class_remove(table, "hidden")?;
    assert_eq!(dom.attr(table, "class"), None);
    Ok(())
}
