//! The session page.

use feedback_core::{FeedbackRequest, SessionMode};
use uuid::Uuid;

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the self-contained page for one session.
pub fn render_page(session_id: Uuid, request: &FeedbackRequest) -> String {
    let (title, summary, submit_label, text_display) = match request.mode {
        SessionMode::Feedback => {
            let summary = if request.work_summary.trim().is_empty() {
                "No work summary provided.".to_string()
            } else {
                escape_html(&request.work_summary)
            };
            ("Feedback requested", summary, "Submit feedback", "block")
        }
        SessionMode::PickImage => (
            "Pick an image",
            "Choose a file or paste from the clipboard, then confirm.".to_string(),
            "Use this image",
            "none",
        ),
    };

    // Summary goes in last so its text is never scanned for placeholders.
    PAGE.replace("__TITLE__", title)
        .replace("__SUBMIT_LABEL__", submit_label)
        .replace("__TEXT_DISPLAY__", text_display)
        .replace("__SESSION_ID__", &session_id.to_string())
        .replace("__TIMEOUT_SECS__", &request.timeout.as_secs().to_string())
        .replace("__SUMMARY__", &summary)
}

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<style>
  body { font-family: system-ui, -apple-system, sans-serif; max-width: 760px; margin: 32px auto; padding: 0 16px; color: #1f2328; }
  h1 { font-size: 1.4em; }
  .summary { white-space: pre-wrap; background: #f6f8fa; border: 1px solid #d0d7de; border-radius: 6px; padding: 12px; }
  textarea { width: 100%; min-height: 140px; box-sizing: border-box; font: inherit; padding: 8px; }
  .images { display: flex; flex-wrap: wrap; gap: 8px; margin: 12px 0; }
  .image { border: 1px solid #d0d7de; border-radius: 6px; padding: 6px; font-size: 0.8em; text-align: center; }
  .image img { max-width: 160px; max-height: 120px; display: block; margin-bottom: 4px; }
  .actions { display: flex; gap: 8px; margin-top: 16px; }
  button { font: inherit; padding: 6px 14px; cursor: pointer; }
  .primary { background: #1f883d; color: #fff; border: 1px solid #1a7f37; border-radius: 6px; }
  #status { margin-top: 12px; min-height: 1.2em; }
  .error { color: #cf222e; }
  .meta { color: #656d76; font-size: 0.85em; }
</style>
</head>
<body>
<h1>__TITLE__</h1>
<div class="summary">__SUMMARY__</div>
<p class="meta">Session __SESSION_ID__, closes after __TIMEOUT_SECS__ seconds without an answer.</p>

<textarea id="text" placeholder="Your feedback" style="display: __TEXT_DISPLAY__"></textarea>

<div>
  <input type="file" id="files" accept="image/*" multiple>
  <button id="paste">Paste from clipboard</button>
  <button id="clear">Remove all images</button>
</div>
<div class="images" id="images"></div>

<div class="actions">
  <button class="primary" id="submit">__SUBMIT_LABEL__</button>
  <button id="cancel">Cancel</button>
</div>
<div id="status"></div>

<script>
const statusEl = document.getElementById('status');
const controls = ['text', 'files', 'paste', 'clear', 'submit', 'cancel'];

function showStatus(message, isError) {
  statusEl.textContent = message;
  statusEl.className = isError ? 'error' : '';
}

async function call(method, url, body, headers) {
  const response = await fetch(url, { method, body, headers });
  const payload = await response.json().catch(() => null);
  if (!response.ok) {
    const message = payload && payload.error ? payload.error.message : response.statusText;
    throw new Error(message);
  }
  return payload;
}

function renderImages(images) {
  const container = document.getElementById('images');
  container.innerHTML = '';
  images.forEach((image) => {
    const item = document.createElement('div');
    item.className = 'image';
    const img = document.createElement('img');
    img.src = '/api/images/' + image.index + '?v=' + Date.now();
    const label = document.createElement('div');
    label.textContent = image.source + ' (' + image.width + 'x' + image.height + ')';
    const remove = document.createElement('button');
    remove.textContent = 'Remove';
    remove.onclick = () => run(async () => renderImages(await call('DELETE', '/api/images/' + image.index)));
    item.append(img, label, remove);
    container.append(item);
  });
}

async function refresh() {
  const session = await call('GET', '/api/session');
  renderImages(session.images);
  if (!session.open) {
    closePage('This session is closed.');
  }
}

function closePage(message) {
  controls.forEach((id) => { document.getElementById(id).disabled = true; });
  showStatus(message, false);
}

async function run(action) {
  try {
    showStatus('', false);
    await action();
  } catch (e) {
    showStatus(e.message, true);
  }
}

document.getElementById('files').onchange = (event) => run(async () => {
  for (const file of event.target.files) {
    try {
      await call('POST', '/api/images?name=' + encodeURIComponent(file.name), file,
        { 'Content-Type': 'application/octet-stream' });
    } catch (e) {
      showStatus(e.message, true);
    }
  }
  event.target.value = '';
  await refresh();
});

document.getElementById('paste').onclick = () => run(async () => {
  await call('POST', '/api/images/clipboard');
  await refresh();
});

document.getElementById('clear').onclick = () => run(async () => {
  renderImages(await call('DELETE', '/api/images'));
});

document.getElementById('submit').onclick = () => run(async () => {
  const text = document.getElementById('text').value;
  await call('POST', '/api/submit', JSON.stringify({ text }), { 'Content-Type': 'application/json' });
  closePage('Thank you. You can close this tab.');
});

document.getElementById('cancel').onclick = () => run(async () => {
  await call('POST', '/api/cancel', JSON.stringify({}), { 'Content-Type': 'application/json' });
  closePage('Cancelled. You can close this tab.');
});

refresh().catch((e) => showStatus(e.message, true));
setInterval(() => refresh().catch(() => closePage('This session is closed.')), 3000);
</script>
</body>
</html>
"#;
