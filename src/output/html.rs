//! HTML report output format.
//!
//! Generates a self-contained, printable HTML report with the project
//! sheet, the check results and an executive summary.

use crate::model::{ProjectInfo, ScanReport};
use anyhow::Result;

/// Longest detail text shown in the results table.
const MAX_DETAIL_LEN: usize = 100;

/// Generate and print HTML report output
pub fn print_html(report: &ScanReport, project: &ProjectInfo) -> Result<()> {
    println!("{}", generate_html_string(report, project));
    Ok(())
}

/// Generate HTML as a string (for file output)
pub fn generate_html_string(report: &ScanReport, project: &ProjectInfo) -> String {
    let mut html = String::new();

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Security Checkpoint - {}</title>
    <style>
        :root {{
            --text-color: #222;
            --text-muted: #666;
            --border-color: #333;
            --label-bg: #add8e6;
            --head-bg: #808080;
            --row-bg: #f5f5dc;
            --pass: #28a745;
            --fail: #dc3545;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: Helvetica, Arial, sans-serif;
            color: var(--text-color);
            line-height: 1.5;
            padding: 2rem;
        }}
        .container {{ max-width: 900px; margin: 0 auto; }}
        h1 {{ text-align: center; color: #0000ff; font-size: 1.6rem; margin-bottom: 2rem; }}
        h2 {{ font-size: 1.2rem; margin: 2rem 0 1rem; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ border: 1px solid var(--border-color); padding: 0.5rem 0.75rem; text-align: left; vertical-align: top; }}
        .sheet th {{ background: var(--label-bg); width: 30%; font-weight: normal; }}
        .results th {{ background: var(--head-bg); color: #f5f5f5; }}
        .results td {{ background: var(--row-bg); }}
        .pass {{ color: var(--pass); font-weight: 600; }}
        .fail {{ color: var(--fail); font-weight: 600; }}
        .status {{ font-weight: 700; margin-top: 1rem; }}
        footer {{ text-align: center; color: var(--text-muted); font-size: 0.8rem; margin-top: 2rem; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Security Checkpoint - Pre-checks</h1>
"#,
        html_escape(&report.target)
    ));

    // Project sheet
    let sheet = [
        ("Status", report.status.as_str().to_string()),
        ("Author", project.author.clone()),
        ("Project", project.name.clone()),
        ("URL", report.target.clone()),
        ("Ticket", project.ticket.clone()),
        ("Version", project.version.clone()),
        ("Date", report.scanned_at.format("%d/%m/%Y %H:%M:%S").to_string()),
    ];

    html.push_str("        <table class=\"sheet\">\n");
    for (label, value) in &sheet {
        html.push_str(&format!(
            "            <tr><th>{}</th><td>{}</td></tr>\n",
            label,
            html_escape(value)
        ));
    }
    html.push_str("        </table>\n");

    // Results
    html.push_str(
        r#"        <h2>Test Results</h2>
        <table class="results">
            <thead>
                <tr>
                    <th>Check</th>
                    <th>Status</th>
                    <th>Details</th>
                </tr>
            </thead>
            <tbody>
"#,
    );

    for check in &report.checks {
        let class = if check.passed { "pass" } else { "fail" };
        html.push_str(&format!(
            r#"                <tr>
                    <td>{}</td>
                    <td class="{}">{}</td>
                    <td>{}</td>
                </tr>
"#,
            html_escape(&check.title()),
            class,
            check.verdict(),
            html_escape(&shorten(&check.detail, MAX_DETAIL_LEN))
        ));
    }

    html.push_str(
        r#"            </tbody>
        </table>
"#,
    );

    // Executive summary
    html.push_str(&format!(
        r#"        <h2>Executive Summary</h2>
        <p>Total checks performed: {}</p>
        <p>Checks passed: {}</p>
        <p>Checks failed: {}</p>
        <p class="status">Final status: {}</p>
        <footer>
            Generated by webcheckpoint
        </footer>
    </div>
</body>
</html>
"#,
        report.total, report.passed, report.failed, report.status
    ));

    html
}

/// Cuts `text` to `max` characters, marking the cut with "...".
fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max).collect();
        format!("{}...", kept)
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
