//! HTML pages for the form, result and error views

use riskcalc_core::{Assessment, FeatureId, Locale};
use std::fmt::{self, Write as _};

/// Name of the hidden form field carrying the locale tag
pub const LANG_FIELD: &str = "current_lang";

struct Strings {
    html_lang: &'static str,
    title: &'static str,
    intro: &'static str,
    submit: &'static str,
    result_title: &'static str,
    probability: &'static str,
    tier: &'static str,
    inputs: &'static str,
    degraded: &'static str,
    error_title: &'static str,
    back: &'static str,
    switch_to: &'static str,
}

const ZH_CN: Strings = Strings {
    html_lang: "zh-CN",
    title: "风险预测",
    intro: "请选择以下六项信息，系统将估计风险概率。",
    submit: "预测",
    result_title: "预测结果",
    probability: "风险概率",
    tier: "风险等级",
    inputs: "填写的信息",
    degraded: "模型当前不可用，以下结果为默认值，仅供参考。",
    error_title: "预测出错",
    back: "返回",
    switch_to: "English",
};

const EN: Strings = Strings {
    html_lang: "en",
    title: "Risk Prediction",
    intro: "Answer the six questions below to estimate the risk probability.",
    submit: "Predict",
    result_title: "Prediction Result",
    probability: "Risk probability",
    tier: "Risk level",
    inputs: "Your answers",
    degraded: "The model is currently unavailable. The result below is a default value for reference only.",
    error_title: "Prediction Error",
    back: "Back",
    switch_to: "中文",
};

fn strings(locale: Locale) -> &'static Strings {
    match locale {
        Locale::ZhCn => &ZH_CN,
        Locale::En => &EN,
    }
}

fn other(locale: Locale) -> Locale {
    match locale {
        Locale::ZhCn => Locale::En,
        Locale::En => Locale::ZhCn,
    }
}

/// Escape text for use in element content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn page(locale: Locale, title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{
            font-family: Arial, "Microsoft YaHei", sans-serif;
            max-width: 720px;
            margin: 40px auto;
            padding: 20px;
            background: #f5f5f5;
        }}
        .container {{
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }}
        h1 {{
            color: #333;
            border-bottom: 3px solid #4CAF50;
            padding-bottom: 10px;
        }}
        .field {{ margin: 14px 0; }}
        .field label {{ display: block; font-weight: bold; margin-bottom: 4px; }}
        select, button {{ font-size: 1em; padding: 6px; }}
        .lang {{ float: right; font-size: 0.9em; }}
        .tier-low {{ color: #2e7d32; }}
        .tier-moderate {{ color: #ef6c00; }}
        .tier-high {{ color: #c62828; }}
        .notice {{ background: #fff3cd; border-left: 4px solid #ef6c00; padding: 10px; }}
        .error {{ background: #fdecea; border-left: 4px solid #c62828; padding: 10px; }}
    </style>
</head>
<body>
    <div class="container">
{body}
    </div>
</body>
</html>
"#,
        lang = strings(locale).html_lang,
        title = escape(title),
        body = body,
    )
}

/// Input form with every feature and its options in the active locale
pub fn render_form(locale: Locale) -> String {
    let s = strings(locale);
    match form_body(locale) {
        Ok(body) => page(locale, s.title, &body),
        Err(err) => render_error(locale, &err.to_string()),
    }
}

fn form_body(locale: Locale) -> Result<String, fmt::Error> {
    let s = strings(locale);
    let mut body = String::new();

    writeln!(
        body,
        r#"        <a class="lang" href="/?lang={}">{}</a>"#,
        other(locale).tag(),
        s.switch_to
    )?;
    writeln!(body, "        <h1>{}</h1>", s.title)?;
    writeln!(body, "        <p>{}</p>", s.intro)?;
    writeln!(body, r#"        <form method="post" action="/predict">"#)?;
    writeln!(
        body,
        r#"            <input type="hidden" name="{LANG_FIELD}" value="{}">"#,
        locale.tag()
    )?;

    for (i, feature) in FeatureId::ALL.into_iter().enumerate() {
        let label = escape(feature.label(locale));
        writeln!(body, r#"            <div class="field">"#)?;
        writeln!(body, r#"                <label for="f{i}">{label}</label>"#)?;
        writeln!(
            body,
            r#"                <select id="f{i}" name="{label}" required>"#
        )?;
        for option in feature.options() {
            let text = escape(option.label(locale));
            writeln!(
                body,
                r#"                    <option value="{text}">{text}</option>"#
            )?;
        }
        writeln!(body, "                </select>")?;
        writeln!(body, "            </div>")?;
    }

    writeln!(body, r#"            <button type="submit">{}</button>"#, s.submit)?;
    write!(body, "        </form>")?;
    Ok(body)
}

/// Data shown on the result page
pub struct ResultView<'a> {
    pub locale: Locale,
    pub assessment: &'a Assessment,
    /// Submitted `(label, option)` pairs, echoed as received
    pub inputs: &'a [(String, String)],
}

pub fn render_result(view: &ResultView<'_>) -> String {
    let s = strings(view.locale);
    match result_body(view) {
        Ok(body) => page(view.locale, s.result_title, &body),
        Err(err) => render_error(view.locale, &err.to_string()),
    }
}

fn result_body(view: &ResultView<'_>) -> Result<String, fmt::Error> {
    let locale = view.locale;
    let s = strings(locale);
    let assessment = view.assessment;
    let mut body = String::new();

    writeln!(body, "        <h1>{}</h1>", s.result_title)?;
    if assessment.is_degraded() {
        writeln!(body, r#"        <p class="notice">{}</p>"#, s.degraded)?;
    }
    writeln!(
        body,
        r#"        <p>{}: <strong id="probability">{}</strong></p>"#,
        s.probability,
        assessment.formatted_probability()
    )?;
    writeln!(
        body,
        r#"        <p>{}: <strong id="tier" class="tier-{code}" data-tier="{code}">{}</strong></p>"#,
        s.tier,
        assessment.tier_label(locale),
        code = assessment.tier.code()
    )?;

    writeln!(body, "        <h2>{}</h2>", s.inputs)?;
    writeln!(body, "        <ul>")?;
    for (label, option) in view.inputs {
        writeln!(body, "            <li>{}: {}</li>", escape(label), escape(option))?;
    }
    writeln!(body, "        </ul>")?;
    write!(
        body,
        r#"        <p><a href="/?lang={}">{}</a></p>"#,
        locale.tag(),
        s.back
    )?;
    Ok(body)
}

pub fn render_error(locale: Locale, message: &str) -> String {
    let s = strings(locale);
    let body = format!(
        r#"        <h1>{title}</h1>
        <p class="error" id="error-message">{message}</p>
        <p><a href="/?lang={tag}">{back}</a></p>"#,
        title = s.error_title,
        message = escape(message),
        tag = locale.tag(),
        back = s.back,
    );
    page(locale, s.error_title, &body)
}
