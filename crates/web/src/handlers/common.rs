use maud::{Markup, PreEscaped, html};

use crate::handlers::csp::Nonce;

pub fn header(nonce: &Nonce) -> Markup {
    html! {
        meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1";
        meta name="color-scheme" content="dark light";
        script nonce=(nonce.0) { (PreEscaped(r#"let t;try{t=localStorage.getItem("theme")}catch(_){}document.documentElement.setAttribute("data-theme",t||"dark");"#)) }
        style nonce=(nonce.0) { (PreEscaped(STYLE)) }
    }
}

pub fn theme_toggle() -> Markup {
    html! {
        button #theme-toggle type="button" title="Toggle theme" aria-label="Toggle theme" {
            span .icon-light { "☀" }
            span .icon-dark { "☾" }
        }
    }
}

pub fn footer() -> Markup {
    html! {
        footer {
            small .muted {
                "Images are rendered on demand at "
                code { "/api/og" }
            }
        }
    }
}

const STYLE: &str = r#"
:root {
  --bg: #ffffff; --fg: #0f172a; --card: #f8fafc; --border: #e2e8f0;
  --muted: #64748b; --muted-bg: #f1f5f9; --error: #ef4444;
}
[data-theme="dark"] {
  --bg: #020617; --fg: #f8fafc; --card: #0f172a; --border: #1e293b;
  --muted: #94a3b8; --muted-bg: #1e293b;
}
* { box-sizing: border-box; }
body {
  margin: 0; min-height: 100vh; padding: 2rem 1rem;
  background: var(--bg); color: var(--fg);
  font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
}
main { max-width: 80rem; margin: 0 auto; }
.hero { text-align: center; margin-bottom: 3rem; }
.hero h1 {
  font-size: clamp(1.875rem, 5vw, 3rem); margin: 0 0 1rem;
  background: linear-gradient(to right, #3b82f6, #a855f7);
  -webkit-background-clip: text; background-clip: text; color: transparent;
}
.hero p, .muted { color: var(--muted); }
.grid { display: grid; gap: 2rem; grid-auto-rows: 1fr; }
@media (min-width: 768px) { .grid { grid-template-columns: 1fr 1fr; } }
.card {
  display: flex; flex-direction: column; padding: 1.5rem;
  background: var(--card); border: 1px solid var(--border); border-radius: 0.75rem;
  box-shadow: 0 10px 15px -3px rgb(0 0 0 / 0.1);
}
form { display: flex; flex-direction: column; gap: 1.5rem; }
.field { display: flex; flex-direction: column; gap: 0.5rem; }
label { font-size: 0.875rem; font-weight: 500; }
input, textarea {
  width: 100%; padding: 0.5rem 0.75rem; font: inherit;
  background: var(--bg); color: var(--fg);
  border: 1px solid var(--border); border-radius: 0.375rem;
}
textarea { min-height: 6rem; resize: vertical; }
.error { color: var(--error); font-size: 0.875rem; margin: 0; }
.hint { color: var(--muted); font-size: 0.875rem; margin: 0; }
button[type="submit"] {
  padding: 0.75rem 1.5rem; border: 0; border-radius: 0.5rem; cursor: pointer;
  font: inherit; font-weight: 500; color: #ffffff;
  background: linear-gradient(to right, #3b82f6, #9333ea);
}
button[type="submit"]:hover { background: linear-gradient(to right, #2563eb, #7e22ce); }
.preview img { width: 100%; height: auto; aspect-ratio: 1200 / 630; object-fit: cover; border-radius: 0.5rem; }
.generated { display: flex; flex-direction: column; gap: 0.5rem; margin-top: 1.5rem; }
.url-row {
  display: flex; align-items: center; justify-content: space-between; gap: 0.5rem;
  padding: 0.5rem 0.75rem; background: var(--muted-bg); border-radius: 0.375rem;
}
.url-row code { font-size: 0.875rem; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
#copy-url {
  flex-shrink: 0; padding: 0.25rem 0.5rem; cursor: pointer; font: inherit; font-size: 0.875rem;
  color: var(--muted); background: transparent; border: 1px solid var(--border); border-radius: 0.375rem;
}
#copy-url.copied { color: #22c55e; border-color: #22c55e; }
#theme-toggle {
  position: fixed; top: 1rem; right: 1rem; padding: 0.5rem; cursor: pointer;
  font-size: 1.25rem; line-height: 1; color: var(--fg);
  background: rgb(148 163 184 / 0.15); border: 0; border-radius: 9999px;
}
[data-theme="dark"] #theme-toggle .icon-light, [data-theme="light"] #theme-toggle .icon-dark { display: none; }
footer { text-align: center; margin-top: 3rem; }
"#;
