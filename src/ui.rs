use crate::models::{DayView, DeedView, Summary};
use crate::quotes::Quote;
use crate::scoring::{Rank, PRAYER_POINTS};

pub fn render_index(day: &DayView, summary: &Summary, quote: &Quote) -> String {
    let prayers: String = day
        .prayers
        .iter()
        .map(|status| {
            let (class, label) = if status.done {
                ("prayer done", format!("Done (+{PRAYER_POINTS}) &middot; Undo"))
            } else {
                ("prayer", "Mark done".to_string())
            };
            format!(
                r#"<form class="{class}" method="post" action="/prayers/{name}/toggle"><span>{name}</span><button type="submit">{label}</button></form>"#,
                name = status.name,
            )
        })
        .collect();

    let deeds: String = day
        .good_deeds
        .iter()
        .chain(day.bad_deeds.iter())
        .map(render_deed)
        .collect();
    let deeds = if deeds.is_empty() {
        r#"<li class="empty">No deeds added today</li>"#.to_string()
    } else {
        deeds
    };

    INDEX_HTML
        .replace("{{DATE}}", &day.date)
        .replace("{{PRAYERS}}", &prayers)
        .replace("{{DEEDS}}", &deeds)
        .replace("{{PRAYER_SCORE}}", &day.prayer_score.to_string())
        .replace("{{DEED_SCORE}}", &day.deed_score.to_string())
        .replace("{{SCORE}}", &day.score.to_string())
        .replace("{{TOTAL_SCORE}}", &summary.total_score.to_string())
        .replace("{{COMPLETION}}", &summary.prayer_completion.to_string())
        .replace("{{RANK}}", Rank::for_score(summary.total_score).label())
        .replace("{{QUOTE}}", &escape_html(quote.text))
        .replace("{{SOURCE}}", &escape_html(quote.source))
}

fn render_deed(deed: &DeedView) -> String {
    let (class, sign) = if deed.points > 0 { ("good", "+") } else { ("bad", "") };
    format!(
        r#"<li class="{class}"><span>{}</span><strong>{sign}{}</strong></li>"#,
        escape_html(&deed.description),
        deed.points,
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Ramadan Tracker</title>
  <style>
    :root {
      --bg: #0a0a0a;
      --card: #140505;
      --ink: #f5f5f5;
      --muted: #9ca3af;
      --accent: #dc2626;
      --good: #4ade80;
      --bad: #ef4444;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 16px;
    }

    main { width: min(820px, 100%); display: grid; gap: 24px; }
    h1 { color: var(--accent); margin: 0; }
    h2 { margin: 0 0 12px; font-size: 1.2rem; }
    .muted { color: var(--muted); margin: 4px 0 0; }

    section {
      background: var(--card);
      border: 1px solid #3f0000;
      border-radius: 18px;
      padding: 20px;
    }

    .scores { display: grid; grid-template-columns: repeat(auto-fit, minmax(140px, 1fr)); gap: 12px; }
    .scores div { display: grid; gap: 4px; }
    .scores .label { font-size: 0.75rem; letter-spacing: 0.12em; text-transform: uppercase; color: var(--muted); }
    .scores .value { font-size: 1.6rem; font-weight: 700; }

    .prayer { display: flex; justify-content: space-between; align-items: center; padding: 10px 0; border-bottom: 1px solid #2a0000; }
    .prayer.done span { color: var(--good); }

    button {
      border: none;
      border-radius: 999px;
      padding: 8px 16px;
      font-weight: 600;
      background: var(--accent);
      color: white;
      cursor: pointer;
    }

    .deed-form { display: grid; grid-template-columns: 2fr 1fr 1fr auto; gap: 8px; }
    input, select { padding: 8px 10px; border-radius: 10px; border: 1px solid #3f0000; background: #000; color: var(--ink); }

    ul { list-style: none; padding: 0; margin: 12px 0 0; }
    li { display: flex; justify-content: space-between; padding: 8px 0; }
    li.good strong { color: var(--good); }
    li.bad strong { color: var(--bad); }
    li.empty { color: var(--muted); }

    blockquote { margin: 0; font-style: italic; }

    @media (max-width: 600px) {
      .deed-form { grid-template-columns: 1fr; }
    }
  </style>
</head>
<body>
  <main>
    <header>
      <h1>Ramadan Tracker</h1>
      <p class="muted">{{DATE}} &middot; Rank: {{RANK}}</p>
    </header>

    <section class="scores">
      <div><span class="label">Prayer points</span><span class="value">{{PRAYER_SCORE}}</span></div>
      <div><span class="label">Deed points</span><span class="value">{{DEED_SCORE}}</span></div>
      <div><span class="label">Today</span><span class="value">{{SCORE}}</span></div>
      <div><span class="label">Ramadan score</span><span class="value">{{TOTAL_SCORE}}</span></div>
      <div><span class="label">Prayer completion</span><span class="value">{{COMPLETION}}%</span></div>
    </section>

    <section>
      <h2>Today's Salat</h2>
      {{PRAYERS}}
    </section>

    <section>
      <h2>Good &amp; Bad Deeds</h2>
      <form class="deed-form" method="post" action="/deeds/new">
        <input name="description" placeholder="What did you do?" required />
        <input name="points" type="number" min="1" step="1" placeholder="Points" required />
        <select name="type">
          <option value="good">Good (+)</option>
          <option value="bad">Bad (-)</option>
        </select>
        <button type="submit">Add deed</button>
      </form>
      <ul>{{DEEDS}}</ul>
    </section>

    <section>
      <h2>Daily Motivation</h2>
      <blockquote>"{{QUOTE}}"</blockquote>
      <p class="muted">{{SOURCE}}</p>
    </section>
  </main>
</body>
</html>
"#;
