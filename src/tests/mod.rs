use super::*;

mod html_parsing;
mod trace_logs;

const OPEN_ICON: &str = "resources/images/folder.png";
const CLOSED_ICON: &str = "resources/images/folder_closed.png";

/// One version with a nested section, a deeper nested section, and leaves.
const REPORT_HTML: &str = r#"
<table id="matrix">
  <tr class="version" id="v1">
    <td><img class="handler" src="resources/images/folder.png"></td>
    <td>
      <table id="v1-table">
        <tr id="v1-s1" class="parent-v1-0"><td><img id="v1-s1-icon" class="handler"></td><td>Framework</td></tr>
        <tr id="v1-s1-sub" class="subsections">
          <td colspan="2">
            <table>
              <tr id="v1-s1-a" class="parent-v1-s1"><td>Bundles</td></tr>
              <tr id="v1-s1-b" class="parent-v1-s1"><td>Services</td></tr>
              <tr id="v1-s1-b-sub" class="subsections">
                <td>
                  <table>
                    <tr id="v1-s1-b-x" class="parent-v1-s1-b"><td>Registry</td></tr>
                  </table>
                </td>
              </tr>
            </table>
          </td>
        </tr>
        <tr id="v1-s2" class="parent-v1-0"><td>Log</td></tr>
      </table>
    </td>
  </tr>
</table>
"#;

fn report() -> Result<ReportPage> {
    ReportPage::from_html(REPORT_HTML)
}
