//! Full pages: shared layout plus the home, achievements and 404 bodies.

use super::achievements::{render_grouped, render_list};
use super::jsonld::person_script_tag;
use super::{escape_html, nl2br, picture};
use crate::contact::ContactStatus;
use crate::presentation::{LoadingScreen, LoadingState, Sidebar, ThemeMode};
use crate::primitives::THEME_COOKIE;
use crate::settings::SiteConfig;
use crate::video::{embed_url, youtube_video_id};
use crate::{AchievementCategory, VideoEntry};

/// Element id the sidebar returns focus to.
pub const MENU_TRIGGER_ID: &str = "menu-toggle";

/// Per-request inputs to a page.
#[derive(Debug, Clone)]
pub struct PageContext<'a> {
    pub config: &'a SiteConfig,
    pub theme: ThemeMode,
    pub sidebar: Sidebar,
    pub contact_status: Option<ContactStatus>,
    /// Anti-forgery token for the contact form.
    pub contact_token: String,
    /// Request path (with query) the page was served for.
    pub path: String,
}

impl<'a> PageContext<'a> {
    /// Context with defaults for everything but the config.
    #[must_use]
    pub fn new(config: &'a SiteConfig, path: impl Into<String>) -> Self {
        Self {
            config,
            theme: ThemeMode::default(),
            sidebar: Sidebar::Closed,
            contact_status: None,
            contact_token: String::new(),
            path: path.into(),
        }
    }

    /// Path without query or fragment.
    fn bare_path(&self) -> &str {
        self.path
            .split(['?', '#'])
            .next()
            .filter(|p| !p.is_empty())
            .unwrap_or("/")
    }
}

/// Top navigation: label, href, section id used for scroll highlighting.
const NAV: [(&str, &str, &str); 5] = [
    ("Home", "/", "top"),
    ("About", "/#about", "about"),
    ("Videos", "/#videos", "videos"),
    ("Achievements", "/achievements", "achievements"),
    ("Contact", "/#contact", "contact"),
];

fn nav_links(ctx: &PageContext<'_>, class: &str) -> String {
    let current = ctx.bare_path();
    let mut out = format!("<ul class=\"{class}\">");
    for (label, href, section) in NAV {
        let is_current = href == current;
        out.push_str(&format!(
            "<li><a href=\"{href}\" data-section=\"{section}\"{}>{label}</a></li>",
            if is_current { " aria-current=\"page\"" } else { "" }
        ));
    }
    out.push_str("</ul>");
    out
}

fn loading_screen(ctx: &PageContext<'_>) -> String {
    if !ctx.config.loading_screen_enabled {
        return String::new();
    }
    let screen = LoadingScreen::default();
    // Server markup is the first frame; the script advances from there.
    let LoadingState::Showing { step, percent } = screen.state_at(0, false) else {
        return String::new();
    };
    let labels: Vec<String> = screen
        .steps
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "<li{} data-at-ms=\"{}\" data-percent=\"{}\">{}</li>",
                if i == step { " class=\"is-current\"" } else { "" },
                s.at_ms,
                s.percent,
                escape_html(s.label)
            )
        })
        .collect();
    format!(
        "<div id=\"loading-screen\" role=\"status\" aria-live=\"polite\" data-min-display-ms=\"{}\" data-timeout-ms=\"{}\">\
<div class=\"loading-name\">{}</div><div class=\"loading-bar\" data-percent=\"{}\"><span style=\"width:{}%\"></span></div>\
<ol class=\"loading-steps\">{}</ol></div>",
        screen.min_display_ms,
        screen.timeout_ms,
        escape_html(&ctx.config.vtuber_name),
        percent,
        percent,
        labels.concat()
    )
}

fn sidebar(ctx: &PageContext<'_>) -> String {
    let open = ctx.sidebar.is_open();
    // Closing goes back to the trigger so keyboard focus lands where it left.
    let (_, focus) = ctx.sidebar.clone().close();
    let close_href = format!(
        "{}#{}",
        escape_html(ctx.bare_path()),
        escape_html(focus.as_deref().unwrap_or(MENU_TRIGGER_ID))
    );
    format!(
        "<aside id=\"sidebar\" class=\"sidebar\" data-state=\"{}\" aria-hidden=\"{}\" data-return-focus=\"{}\">\
<a class=\"sidebar-close\" href=\"{}\" aria-label=\"Close menu\">×</a>{}</aside>",
        if open { "open" } else { "closed" },
        !open,
        MENU_TRIGGER_ID,
        close_href,
        nav_links(ctx, "sidebar-nav")
    )
}

fn social_links(config: &SiteConfig) -> String {
    let mut out = String::from("<ul class=\"social-links\">");
    for link in config.filled_socials() {
        out.push_str(&format!(
            "<li><a href=\"{}\" rel=\"noopener me\" target=\"_blank\">{}</a></li>",
            escape_html(&link.url),
            escape_html(link.platform)
        ));
    }
    out.push_str("</ul>");
    out
}

/// Client script: theme persistence, loading screen completion, sidebar
/// focus handling, scroll highlighting, fade-in and broken image hiding.
const SITE_SCRIPT: &str = r#"<script>
(function(){
var d=document,root=d.documentElement;
var t=d.getElementById('theme-toggle');
if(t){t.addEventListener('submit',function(e){e.preventDefault();var n=root.dataset.theme==='dark'?'light':'dark';root.dataset.theme=n;d.cookie='__COOKIE__='+n+';path=/;max-age=31536000;samesite=lax';});}
var ls=d.getElementById('loading-screen');
if(ls){var start=Date.now(),min=+ls.dataset.minDisplayMs,max=+ls.dataset.timeoutMs,done=false;
var finish=function(){if(done)return;done=true;ls.classList.add('is-done');};
var bar=ls.querySelector('.loading-bar span');
ls.querySelectorAll('.loading-steps li').forEach(function(li){setTimeout(function(){if(done)return;ls.querySelectorAll('.loading-steps li').forEach(function(o){o.classList.toggle('is-current',o===li);});if(bar)bar.style.width=li.dataset.percent+'%';},+li.dataset.atMs);});
var loaded=new Promise(function(r){if(d.readyState==='complete')r();else window.addEventListener('load',r,{once:true});});
Promise.race([loaded.then(function(){return new Promise(function(r){setTimeout(r,Math.max(0,min-(Date.now()-start)));});}),new Promise(function(r){setTimeout(r,max);})]).then(finish);}
var sb=d.getElementById('sidebar'),trig=d.getElementById('__TRIGGER__');
if(sb&&trig){var close=function(){sb.dataset.state='closed';sb.setAttribute('aria-hidden','true');trig.focus();};
trig.addEventListener('click',function(e){e.preventDefault();sb.dataset.state='open';sb.setAttribute('aria-hidden','false');var f=sb.querySelector('a');if(f)f.focus();});
sb.querySelector('.sidebar-close').addEventListener('click',function(e){e.preventDefault();close();});
sb.addEventListener('keydown',function(e){if(e.key==='Escape'){close();return;}if(e.key!=='Tab')return;var a=sb.querySelectorAll('a');var first=a[0],last=a[a.length-1];if(e.shiftKey&&d.activeElement===first){e.preventDefault();last.focus();}else if(!e.shiftKey&&d.activeElement===last){e.preventDefault();first.focus();}});}
if('IntersectionObserver' in window){var io=new IntersectionObserver(function(es){es.forEach(function(en){if(en.isIntersecting){en.target.classList.add('is-visible');var id=en.target.id;if(id){d.querySelectorAll('[data-section]').forEach(function(l){l.classList.toggle('is-active',l.dataset.section===id);});}}});},{threshold:0.2});
d.querySelectorAll('.fade-in, section[id]').forEach(function(el){io.observe(el);});}
d.querySelectorAll('img[data-hide-on-error]').forEach(function(img){img.addEventListener('error',function(){img.style.display='none';});});
})();
</script>"#;

fn site_script() -> String {
    SITE_SCRIPT
        .replace("__COOKIE__", THEME_COOKIE)
        .replace("__TRIGGER__", MENU_TRIGGER_ID)
}

/// Wrap `body` in the shared layout.
fn layout(ctx: &PageContext<'_>, title: &str, head_extra: &str, body: &str) -> String {
    let config = ctx.config;
    let page_title = if title.is_empty() {
        config.site_title.clone()
    } else {
        format!("{} | {}", title, config.site_title)
    };
    let redirect = escape_html(&ctx.path);

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"{theme}\">\n<head>\
<meta charset=\"utf-8\" />\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\
<meta name=\"description\" content=\"{description}\" />\
<title>{page_title}</title>\
<link rel=\"stylesheet\" href=\"/assets/css/site.css\" />{head_extra}</head>\n\
<body>{loading}\
<header class=\"site-header\" id=\"top\">\
<a class=\"site-logo\" href=\"/\">{logo}<span>{site_title}</span></a>\
<nav aria-label=\"Main\">{nav}</nav>\
<form id=\"theme-toggle\" method=\"post\" action=\"/theme\">\
<input type=\"hidden\" name=\"redirect_to\" value=\"{redirect}\" />\
<button type=\"submit\" aria-label=\"Toggle dark mode\">{theme_icon}</button></form>\
<a id=\"{trigger}\" class=\"menu-toggle\" href=\"?menu=open\" aria-controls=\"sidebar\" aria-expanded=\"{expanded}\">Menu</a>\
</header>{sidebar}\
<main>{body}</main>\
<footer class=\"site-footer\">{socials}<p>&copy; {name}</p></footer>\
{script}</body>\n</html>\n",
        theme = ctx.theme.as_str(),
        description = escape_html(&config.tagline),
        page_title = escape_html(&page_title),
        head_extra = head_extra,
        loading = loading_screen(ctx),
        logo = picture(&config.logo_image, &config.site_title, "logo-image"),
        site_title = escape_html(&config.site_title),
        nav = nav_links(ctx, "main-nav"),
        redirect = redirect,
        theme_icon = match ctx.theme {
            ThemeMode::Light => "🌙",
            ThemeMode::Dark => "☀️",
        },
        trigger = MENU_TRIGGER_ID,
        expanded = ctx.sidebar.is_open(),
        sidebar = sidebar(ctx),
        body = body,
        socials = social_links(config),
        name = escape_html(&config.vtuber_name),
        script = site_script(),
    )
}

fn render_video(entry: &VideoEntry, slot: usize) -> String {
    let mut out = format!("<article class=\"video-card fade-in\" data-slot=\"{slot}\">");
    if entry.url.is_empty() {
        out.push_str("<div class=\"video-placeholder\">Coming soon</div>");
    } else if let Some(id) = youtube_video_id(&entry.url) {
        out.push_str(&format!(
            "<div class=\"video-frame\"><iframe src=\"{}\" title=\"{}\" loading=\"lazy\" allowfullscreen></iframe></div>",
            escape_html(&embed_url(&id)),
            escape_html(&entry.title)
        ));
    } else {
        out.push_str(&format!(
            "<a class=\"video-link\" href=\"{}\" rel=\"noopener\" target=\"_blank\">Watch</a>",
            escape_html(&entry.url)
        ));
    }
    if !entry.title.is_empty() {
        out.push_str(&format!("<h3>{}</h3>", escape_html(&entry.title)));
    }
    if !entry.description.is_empty() {
        out.push_str(&format!("<p>{}</p>", nl2br(&entry.description)));
    }
    out.push_str("</article>");
    out
}

fn contact_section(ctx: &PageContext<'_>) -> String {
    if !ctx.config.contact_enabled {
        return String::new();
    }
    let banner = ctx
        .contact_status
        .map(|status| {
            format!(
                "<p class=\"contact-status contact-status--{}\" role=\"alert\">{}</p>",
                status.as_str(),
                escape_html(status.message())
            )
        })
        .unwrap_or_default();

    format!(
        "<section id=\"contact\" class=\"contact\"><h2>Contact</h2>{banner}\
<form method=\"post\" action=\"/contact\" class=\"contact-form\">\
<input type=\"hidden\" name=\"contact_nonce\" value=\"{token}\" />\
<input type=\"hidden\" name=\"redirect_to\" value=\"{redirect}\" />\
<label>Name<input type=\"text\" name=\"contact_name\" required /></label>\
<label>Email<input type=\"email\" name=\"contact_email\" required /></label>\
<label>Subject<input type=\"text\" name=\"contact_subject\" required /></label>\
<label>Message<textarea name=\"contact_message\" rows=\"6\" required></textarea></label>\
<button type=\"submit\">Send</button></form></section>",
        banner = banner,
        token = escape_html(&ctx.contact_token),
        redirect = escape_html(ctx.bare_path()),
    )
}

/// The home page.
pub fn home_page(ctx: &PageContext<'_>) -> String {
    let config = ctx.config;
    let mut body = String::new();

    body.push_str(&format!(
        "<section id=\"hero\" class=\"hero\">{}<h1>{}</h1><p class=\"tagline\">{}</p></section>",
        picture(&config.hero_image, &config.vtuber_name, "hero-image"),
        escape_html(&config.vtuber_name),
        escape_html(&config.tagline)
    ));
    body.push_str(&format!(
        "<section id=\"about\" class=\"about fade-in\"><h2>About</h2><p>{}</p></section>",
        nl2br(&config.about_text)
    ));

    body.push_str("<section id=\"videos\" class=\"videos\"><h2>Videos</h2><div class=\"video-grid\">");
    for (slot, entry) in config.videos.iter().enumerate() {
        body.push_str(&render_video(entry, slot));
    }
    body.push_str("</div></section>");

    body.push_str("<section id=\"achievements\" class=\"achievements\"><h2>Achievements</h2>");
    for category in AchievementCategory::ALL {
        body.push_str(&format!("<h3>{}</h3>", category.heading()));
        body.push_str(&render_list(config.achievements(category), category));
    }
    body.push_str("<p class=\"more\"><a href=\"/achievements\">All achievements</a></p></section>");

    body.push_str(&contact_section(ctx));

    layout(ctx, "", &person_script_tag(config), &body)
}

/// The achievements page: both categories, grouped by year.
pub fn achievements_page(ctx: &PageContext<'_>) -> String {
    let config = ctx.config;
    let mut body = String::from("<section id=\"achievements\" class=\"achievements-page\"><h1>Achievements</h1>");
    for category in AchievementCategory::ALL {
        body.push_str(&format!(
            "<section class=\"achievement-category\" id=\"achievements-{}\"><h2>{}</h2>{}</section>",
            category.as_str(),
            category.heading(),
            render_grouped(config.achievements(category), category)
        ));
    }
    body.push_str("</section>");
    layout(ctx, "Achievements", "", &body)
}

/// The 404 page.
pub fn not_found_page(ctx: &PageContext<'_>) -> String {
    let body = format!(
        "<section class=\"not-found\"><h1>404</h1><p>The page <code>{}</code> could not be found.</p>\
<p><a href=\"/\">Back to top</a></p></section>",
        escape_html(ctx.bare_path())
    );
    layout(ctx, "Page not found", "", &body)
}
