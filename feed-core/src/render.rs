use crate::config::RenderConfig;
use crate::post::PostSummary;

const LIST_OPEN: &str = r#"<ul style="list-style:none;padding:0;margin:0;">"#;
const LIST_CLOSE: &str = "</ul>";

const SKELETON_ROW: &str = r#"<li style="display:flex;gap:12px;margin-bottom:15px;align-items:center;"><div class="skel-base" style="width:70px;height:50px;flex-shrink:0;"></div><div style="flex:1;"><div class="skel-base" style="height:14px;width:85%;margin-bottom:8px;"></div><div class="skel-base" style="height:10px;width:40%;"></div></div></li>"#;

/// Turns post lists into widget markup.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    placeholder_image: String,
}

impl Renderer {
    pub fn new(config: RenderConfig, placeholder_image: impl Into<String>) -> Self {
        Self {
            config,
            placeholder_image: placeholder_image.into(),
        }
    }

    pub fn skeleton_rows(&self, viewport_width: f64) -> usize {
        if viewport_width >= self.config.skeleton_breakpoint_px {
            self.config.skeleton_rows_wide
        } else {
            self.config.skeleton_rows_narrow
        }
    }

    pub fn skeleton(&self, viewport_width: f64) -> String {
        let rows = self.skeleton_rows(viewport_width);
        format!("{LIST_OPEN}{}{LIST_CLOSE}", SKELETON_ROW.repeat(rows))
    }

    pub fn empty(&self) -> String {
        format!("<p>{}</p>", html_escape(&self.config.empty_message))
    }

    pub fn list(&self, items: &[PostSummary]) -> String {
        if items.is_empty() {
            return self.empty();
        }
        let mut out = String::from(LIST_OPEN);
        for item in items {
            out.push_str(&self.row(item));
        }
        out.push_str(LIST_CLOSE);
        out
    }

    fn row(&self, item: &PostSummary) -> String {
        let link = html_escape(&item.link);
        let label = item
            .label
            .as_deref()
            .map(|label| {
                format!(
                    r#" • <a class="post-labels" href="/search/label/{}">{}</a>"#,
                    html_escape(label),
                    html_escape(label)
                )
            })
            .unwrap_or_default();
        format!(
            r#"<li style="display:flex;gap:12px;margin-bottom:15px;align-items:center;"><a href="{link}" class="post-img" style="flex-shrink:0;"><img src="{img}" loading="lazy" decoding="async" style="width:70px;height:50px;object-fit:cover;border-radius:4px;" onerror="this.src='{fallback}'"/></a><div style="flex:1;"><h2 class="h3 jl_fe_title jl_txt_2row" style="margin:0;font-size:16px;line-height:1.4;"><a href="{link}" target="_blank">{title}</a></h2><small style="font-size:11px;color:#888;">{date} • {source}{label}</small></div></li>"#,
            img = html_escape(&item.image_url),
            fallback = html_escape(&self.placeholder_image),
            title = html_escape(&item.title),
            date = html_escape(&item.display_date),
            source = html_escape(item.source_label()),
        )
    }

    /// Plain-text view of rendered markup, for terminals.
    pub fn to_text(markup: &str, width: usize) -> String {
        html2text::from_read(markup.as_bytes(), width).unwrap_or_default()
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
