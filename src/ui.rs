use crate::models::{ThemeMode, TodayResponse};

pub fn render_index(today: &TodayResponse) -> String {
    let net_class = if today.net_calories >= 0.0 { "surplus" } else { "deficit" };
    let theme = match today.theme_mode {
        ThemeMode::Auto => "auto",
        ThemeMode::Light => "light",
        ThemeMode::Dark => "dark",
    };
    let progress = &today.progress;
    let direction = if progress.is_deficit { "lost" } else { "gained" };

    INDEX_HTML
        .replace("{{THEME}}", theme)
        .replace("{{DATE}}", &today.date)
        .replace("{{ELAPSED}}", &format_elapsed(today.elapsed_seconds))
        .replace("{{NET_CLASS}}", net_class)
        .replace("{{NET}}", &format!("{:.1}", today.net_calories.abs()))
        .replace("{{BURNED}}", &format!("{:.1}", today.calories_burned))
        .replace("{{MANUAL}}", &today.manual_calories.to_string())
        .replace("{{BMR}}", &today.bmr.to_string())
        .replace("{{EATEN}}", &today.totals.eaten.to_string())
        .replace("{{OUT}}", &today.totals.burned.to_string())
        .replace("{{POUNDS}}", &progress.pounds.to_string())
        .replace("{{DIRECTION}}", direction)
        .replace("{{PERCENT}}", &progress.percent.to_string())
}

fn format_elapsed(seconds: i64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en" data-theme="{{THEME}}">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Calorie Counter</title>
  <style>
    :root { --bg: #f4f6f5; --ink: #1d2624; --card: #ffffff; --deficit: #168f84; --surplus: #d2493c; }
    [data-theme="dark"] { --bg: #141a19; --ink: #e5ecea; --card: #1f2826; }
    @media (prefers-color-scheme: dark) {
      [data-theme="auto"] { --bg: #141a19; --ink: #e5ecea; --card: #1f2826; }
    }
    body { margin: 0; background: var(--bg); color: var(--ink); font-family: system-ui, sans-serif; display: grid; place-items: center; min-height: 100vh; }
    main { width: min(560px, 100%); background: var(--card); border-radius: 20px; padding: 28px; display: grid; gap: 20px; }
    .ring { text-align: center; font-size: 3rem; font-weight: 700; }
    .ring.deficit { color: var(--deficit); }
    .ring.surplus { color: var(--surplus); }
    .row { display: flex; justify-content: space-between; gap: 12px; }
    .actions { display: flex; gap: 12px; justify-content: center; }
    button { border: none; border-radius: 999px; padding: 12px 22px; font-size: 1rem; cursor: pointer; }
    .week { display: grid; grid-template-columns: repeat(7, 1fr); gap: 6px; font-size: 0.8rem; text-align: center; }
    .week .deficit { color: var(--deficit); }
    .week .surplus { color: var(--surplus); }
    ol { max-height: 160px; overflow-y: auto; padding-left: 20px; }
  </style>
</head>
<body>
  <main>
    <div class="row"><span>{{DATE}}</span><span id="elapsed">{{ELAPSED}}</span></div>
    <div class="ring {{NET_CLASS}}" id="net">{{NET}}</div>
    <div class="row">
      <span>burned {{BURNED}}</span>
      <span>manual {{MANUAL}}</span>
      <span>bmr {{BMR}}</span>
    </div>
    <div class="row"><span>eaten {{EATEN}}</span><span>burned {{OUT}}</span></div>
    <div class="row"><span>{{POUNDS}} lb {{DIRECTION}}</span><span>{{PERCENT}}% to next lb</span></div>
    <div class="actions">
      <form method="post" action="/adjust/sub"><button type="submit">&minus;100</button></form>
      <form method="post" action="/adjust/add"><button type="submit">+100</button></form>
      <form method="post" action="/reset" onsubmit="return confirm('Reset today\'s counter?')"><button type="submit">Reset</button></form>
    </div>
    <section>
      <div class="row"><strong id="week-label"></strong><span id="week-totals"></span></div>
      <div class="week" id="week"></div>
    </section>
    <section>
      <strong>Log</strong>
      <ol id="log"></ol>
    </section>
    <small id="sync"></small>
  </main>
  <script>
    const fmt = (n) => Math.abs(n).toLocaleString(undefined, { maximumFractionDigits: 1 });

    const loadWeek = async () => {
      const week = await (await fetch('/api/week')).json();
      document.getElementById('week-label').textContent = week.label;
      document.getElementById('week-totals').textContent = `in ${week.totals.eaten} / out ${week.totals.burned}`;
      const grid = document.getElementById('week');
      grid.replaceChildren(...week.days.map((day) => {
        const cell = document.createElement('div');
        const tone = day.netCalories < 0 ? 'deficit' : day.netCalories > 0 ? 'surplus' : '';
        cell.className = tone;
        cell.textContent = `${day.date.slice(8)}\n${day.hasData ? fmt(day.netCalories) : ''}`;
        return cell;
      }));
    };

    const loadLog = async () => {
      const entries = await (await fetch('/api/log')).json();
      document.getElementById('log').replaceChildren(...entries.map((entry) => {
        const item = document.createElement('li');
        const time = new Date(entry.timestamp).toLocaleTimeString();
        item.textContent = `${time}  ${entry.amount > 0 ? '+' : ''}${entry.amount}`;
        return item;
      }));
    };

    const loadSync = async () => {
      const sync = await (await fetch('/api/sync')).json();
      document.getElementById('sync').textContent = sync.enabled ? `sync: ${sync.status}` : '';
    };

    const refresh = async () => {
      const today = await (await fetch('/api/today')).json();
      const net = document.getElementById('net');
      net.textContent = fmt(today.netCalories);
      net.className = `ring ${today.netCalories >= 0 ? 'surplus' : 'deficit'}`;
      const s = today.elapsedSeconds;
      const pad = (n) => String(n).padStart(2, '0');
      document.getElementById('elapsed').textContent =
        `${pad(Math.floor(s / 3600))}:${pad(Math.floor((s % 3600) / 60))}:${pad(s % 60)}`;
    };

    Promise.all([loadWeek(), loadLog(), loadSync()]).catch(console.error);
    setInterval(() => refresh().catch(console.error), 1000);
  </script>
</body>
</html>
"#;
