// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTML templates for the dashboard and cache monitor pages

use minijinja::{context, Environment};

use super::pokemon::Pokemon;
use crate::news::newsapi::SourceInfo;
use crate::news::Article;
use crate::Result;

const BASE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }} - datavault</title>
    <style>
        :root {
            --bg-primary: #1a1a2e;
            --bg-secondary: #16213e;
            --bg-card: #0f3460;
            --text-primary: #e8e8e8;
            --text-secondary: #a0a0a0;
            --accent: #e94560;
            --success: #00d9a5;
            --border: #2a2a4a;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }
        .container { max-width: 1400px; margin: 0 auto; padding: 20px; }
        nav {
            background: var(--bg-secondary);
            padding: 15px 20px;
            display: flex;
            align-items: center;
            gap: 30px;
            border-bottom: 1px solid var(--border);
        }
        nav .logo { font-size: 1.5em; font-weight: bold; color: var(--accent); text-decoration: none; }
        nav a { color: var(--text-secondary); text-decoration: none; }
        nav a:hover { color: var(--text-primary); }
        .grid { display: grid; grid-template-columns: 1fr 2fr; gap: 20px; }
        .card { background: var(--bg-card); border-radius: 12px; padding: 20px; margin-bottom: 20px; }
        .card h2 { margin-bottom: 15px; color: var(--accent); }
        .article { border-bottom: 1px solid var(--border); padding: 10px 0; }
        .article a { color: var(--text-primary); }
        .muted { color: var(--text-secondary); font-size: 0.9em; }
        .error { color: var(--accent); }
        .tag { display: inline-block; background: var(--accent); color: white; padding: 2px 8px; border-radius: 12px; font-size: 0.8em; margin: 2px; }
        input, select, button { padding: 6px 10px; border-radius: 6px; border: 1px solid var(--border); background: var(--bg-secondary); color: var(--text-primary); }
        .stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 30px; }
        .stat-card { background: var(--bg-card); border-radius: 12px; padding: 20px; text-align: center; }
        .stat-card .number { font-size: 2.5em; font-weight: bold; color: var(--accent); }
        .stat-card .label { color: var(--text-secondary); font-size: 0.9em; }
    </style>
</head>
<body>
    <nav>
        <a href="/" class="logo">datavault</a>
        <a href="/">Dashboard</a>
        <a href="/monitor">Cache Monitor</a>
    </nav>
    <main class="container">
        {% block content %}{% endblock %}
    </main>
    {% block scripts %}{% endblock %}
</body>
</html>"##;

const DASHBOARD: &str = r##"{% extends "base.html" %}
{% block content %}
<h1>Dashboard</h1>
{% if error %}<p class="error">{{ error }}</p>{% endif %}
<div class="grid">
    <div>
        <div class="card">
            <h2>Pokémon</h2>
            <form id="pokemon-form">
                <input id="pokemon-query" placeholder="Name or number">
                <button type="submit">Search</button>
            </form>
            <div id="pokemon-result">
            {% if pokemon %}
                <h3>#{{ pokemon.id }} {{ pokemon.name | title }}</h3>
                {% if pokemon.sprites.front_default %}<img src="{{ pokemon.sprites.front_default }}" alt="{{ pokemon.name }}">{% endif %}
                <p class="muted">Height {{ pokemon.height }} · Weight {{ pokemon.weight }}</p>
                {% for t in pokemon.types %}<span class="tag">{{ t.type.name }}</span>{% endfor %}
            {% else %}
                <p class="muted">No Pokémon loaded</p>
            {% endif %}
            </div>
        </div>
        <div class="card">
            <h2>Sources</h2>
            <select id="news-source">
                <option value="">All sources</option>
                {% for s in sources %}<option value="{{ s.id or "" }}">{{ s.name or s.id or "" }}</option>{% endfor %}
            </select>
        </div>
    </div>
    <div class="card">
        <h2>News</h2>
        <form id="news-form">
            <input id="news-query" placeholder="Search news">
            <select id="news-category">
                <option value="">Any category</option>
                {% for c in categories %}<option value="{{ c }}">{{ c }}</option>{% endfor %}
            </select>
            <button type="submit">Search</button>
        </form>
        <div id="news-results">
        {% for a in articles %}
            <div class="article">
                <a href="{{ a.url or "#" }}" target="_blank" rel="noopener">{{ a.title }}</a>
                <p>{{ a.description or "" }}</p>
                <p class="muted">{{ a.source.name or "" }} · {{ a.publishedAt or "" }}</p>
            </div>
        {% else %}
            <p class="muted">No articles</p>
        {% endfor %}
        </div>
    </div>
</div>
{% endblock %}
{% block scripts %}
<script>
const escapeHtml = (s) => String(s ?? "").replace(/[&<>"']/g, (c) => ({"&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;", "'": "&#39;"}[c]));

document.getElementById("news-form").addEventListener("submit", async (e) => {
    e.preventDefault();
    const params = new URLSearchParams();
    const q = document.getElementById("news-query").value;
    const category = document.getElementById("news-category").value;
    const source = document.getElementById("news-source").value;
    if (q) params.set("q", q);
    if (category) params.set("category", category);
    if (source) params.set("source", source);
    const target = document.getElementById("news-results");
    try {
        const res = await fetch("/api/news/search?" + params.toString());
        const data = await res.json();
        const articles = data.articles || [];
        target.innerHTML = articles.length ? articles.map((a) => `
            <div class="article">
                <a href="${escapeHtml(a.url)}" target="_blank" rel="noopener">${escapeHtml(a.title)}</a>
                <p>${escapeHtml(a.description)}</p>
                <p class="muted">${escapeHtml(a.source && a.source.name)}</p>
            </div>`).join("") : '<p class="muted">No articles</p>';
    } catch (err) {
        console.error(err);
        target.innerHTML = '<p class="error">Failed to fetch news</p>';
    }
});

document.getElementById("pokemon-form").addEventListener("submit", async (e) => {
    e.preventDefault();
    const query = document.getElementById("pokemon-query").value;
    const target = document.getElementById("pokemon-result");
    try {
        const res = await fetch("/api/pokemon/search?query=" + encodeURIComponent(query));
        const p = await res.json();
        if (p.error) { target.innerHTML = `<p class="error">${escapeHtml(p.error)}</p>`; return; }
        target.innerHTML = `
            <h3>#${p.id} ${escapeHtml(p.name)}</h3>
            ${p.sprites && p.sprites.front_default ? `<img src="${escapeHtml(p.sprites.front_default)}">` : ""}
            <p class="muted">Height ${p.height} · Weight ${p.weight}</p>
            ${(p.types || []).map((t) => `<span class="tag">${escapeHtml(t.type.name)}</span>`).join("")}`;
    } catch (err) {
        console.error(err);
        target.innerHTML = '<p class="error">Failed to fetch Pokémon</p>';
    }
});
</script>
{% endblock %}"##;

const MONITOR: &str = r##"{% extends "base.html" %}
{% block content %}
<h1>Cache Monitor</h1>
<p id="monitor-error" class="error"></p>
<div class="stats-grid">
    <div class="stat-card"><div class="number" id="hit-ratio">-</div><div class="label">Hit ratio %</div></div>
    <div class="stat-card"><div class="number" id="requests">-</div><div class="label">Total requests</div></div>
    <div class="stat-card"><div class="number" id="avg-ms">-</div><div class="label">Avg response ms</div></div>
    <div class="stat-card"><div class="number" id="health">-</div><div class="label">Status</div></div>
    <div class="stat-card"><div class="number" id="usage">-</div><div class="label">Disk usage %</div></div>
</div>
<div class="card">
    <h2>Hit ratio</h2>
    <canvas id="hit-chart" height="80"></canvas>
</div>
<div class="card">
    <button id="btn-optimize">Optimize</button>
    <button id="btn-preload">Preload</button>
    <button id="btn-clear">Clear</button>
    <p id="action-result" class="muted"></p>
</div>
{% endblock %}
{% block scripts %}
<script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
<script>
const POLL_MS = {{ poll_ms }};
const MAX_POINTS = {{ chart_points }};
const chart = new Chart(document.getElementById("hit-chart"), {
    type: "line",
    data: { labels: [], datasets: [{ label: "Hit ratio %", data: [] }, { label: "Avg ms", data: [] }] },
    options: { animation: false }
});

async function getData(path) {
    const res = await fetch(path);
    if (!res.ok) throw new Error(path + " returned " + res.status);
    return (await res.json()).data;
}

async function poll() {
    try {
        const [stats, health, size] = await Promise.all([
            getData("/api/cache/stats"), getData("/api/cache/health"), getData("/api/cache/size")
        ]);
        document.getElementById("hit-ratio").textContent = stats.hit_ratio_percent;
        document.getElementById("requests").textContent = stats.total_requests;
        document.getElementById("avg-ms").textContent = stats.avg_response_ms;
        document.getElementById("health").textContent = health.status;
        document.getElementById("usage").textContent = size.usage_percent;
        chart.data.labels.push(new Date().toLocaleTimeString());
        chart.data.datasets[0].data.push(stats.hit_ratio_percent);
        chart.data.datasets[1].data.push(stats.avg_response_ms);
        if (chart.data.labels.length > MAX_POINTS) {
            chart.data.labels.shift();
            chart.data.datasets.forEach((d) => d.data.shift());
        }
        chart.update();
        document.getElementById("monitor-error").textContent = "";
    } catch (err) {
        console.error(err);
        document.getElementById("monitor-error").textContent = err.message;
    }
}

async function action(method, path) {
    const out = document.getElementById("action-result");
    try {
        const res = await fetch(path, { method });
        out.textContent = JSON.stringify(await res.json());
        poll();
    } catch (err) {
        out.textContent = err.message;
    }
}

document.getElementById("btn-optimize").onclick = () => action("POST", "/api/cache/optimize");
document.getElementById("btn-preload").onclick = () => action("POST", "/api/cache/preload");
document.getElementById("btn-clear").onclick = () => action("DELETE", "/api/cache/clear");

poll();
setInterval(poll, POLL_MS);
</script>
{% endblock %}"##;

/// NewsAPI headline categories offered in the dashboard filter
pub const CATEGORIES: &[&str] = &[
    "business", "entertainment", "general", "health", "science", "sports", "technology",
];

pub fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("base.html", BASE)?;
    env.add_template("dashboard.html", DASHBOARD)?;
    env.add_template("monitor.html", MONITOR)?;
    Ok(env)
}

pub fn render_dashboard(
    env: &Environment<'_>,
    pokemon: Option<&Pokemon>,
    articles: &[Article],
    sources: &[SourceInfo],
    error: Option<&str>,
) -> Result<String> {
    let template = env.get_template("dashboard.html")?;
    Ok(template.render(context! {
        title => "Dashboard",
        pokemon => pokemon,
        articles => articles,
        sources => sources,
        categories => CATEGORIES,
        error => error,
    })?)
}

pub fn render_monitor(env: &Environment<'_>, poll_ms: u64, chart_points: usize) -> Result<String> {
    let template = env.get_template("monitor.html")?;
    Ok(template.render(context! {
        title => "Cache Monitor",
        poll_ms => poll_ms,
        chart_points => chart_points,
    })?)
}
