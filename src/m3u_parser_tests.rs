//! Tests for M3U playlist parsing

use crate::m3u_parser::*;
use crate::models::{PLACEHOLDER_LOGO, UNCATEGORIZED, UNKNOWN_CHANNEL};
use crate::playlist::ParseWarning;

#[test]
fn test_parse_m3u() {
    let content = r#"
#EXTM3U
#EXTINF:-1 tvg-id="cnn" group-title="News",CNN
http://example.com/live/user/pass/1.ts
#EXTINF:-1 tvg-id="bbc" group-title="News",BBC
http://example.com/live/user/pass/2.ts
"#;
    let outcome = parse_m3u(content);
    assert_eq!(outcome.channels.len(), 2);
    assert_eq!(outcome.channels[0].name, "CNN");
    assert_eq!(outcome.channels[0].category, "News");
    assert_eq!(outcome.channels[0].id.as_deref(), Some("cnn"));
    assert_eq!(outcome.channels[1].link, "http://example.com/live/user/pass/2.ts");
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_single_record_fields() {
    let content = "#EXTINF:-1 tvg-logo=\"http://x/logo.png\" group-title=\"News\",BBC News\n\
                   http://stream/bbc.m3u8\n";
    let channels = parse_m3u(content).channels;
    assert_eq!(channels.len(), 1);
    let ch = &channels[0];
    assert_eq!(ch.name, "BBC News");
    assert_eq!(ch.logo, "http://x/logo.png");
    assert_eq!(ch.category, "News");
    assert_eq!(ch.link, "http://stream/bbc.m3u8");
    assert_eq!(ch.language, None);
    assert_eq!(ch.id, None);
    assert_eq!(ch.user_agent, None);
    assert_eq!(ch.cookie, None);
    assert!(ch.headers.is_empty());
}

#[test]
fn test_defaults_for_missing_attributes() {
    let content = "#EXTINF:-1,Plain\nhttp://plain\n";
    let channels = parse_m3u(content).channels;
    assert_eq!(channels[0].logo, PLACEHOLDER_LOGO);
    assert_eq!(channels[0].category, UNCATEGORIZED);
}

#[test]
fn test_missing_name_uses_placeholder() {
    let content = "#EXTINF:-1 group-title=\"Misc\",\nhttp://a\n#EXTINF:-1 group-title=\"Misc\"\nhttp://b\n";
    let channels = parse_m3u(content).channels;
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].name, UNKNOWN_CHANNEL);
    assert_eq!(channels[1].name, UNKNOWN_CHANNEL);
    assert_eq!(channels[1].category, "Misc");
}

#[test]
fn test_language_and_unknown_keys() {
    let content = r#"#EXTINF:-1 tvg-chno="5" tvg-language="Bengali" tvg-id="t1" catchup="default",Toffee
http://toffee
"#;
    let channels = parse_m3u(content).channels;
    assert_eq!(channels[0].language.as_deref(), Some("Bengali"));
    assert_eq!(channels[0].id.as_deref(), Some("t1"));
}

#[test]
fn test_parse_attrs_unquoted() {
    let content = r#"#EXTM3U
#EXTINF:-1 tvg-id=unquoted group-title="Quoted Group",Test Channel
http://example.com/stream.ts
"#;
    let channels = parse_m3u(content).channels;
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].id.as_deref(), Some("unquoted"));
    assert_eq!(channels[0].category, "Quoted Group");
}

#[test]
fn test_quoted_values_with_spaces_and_commas() {
    let content = r#"#EXTINF:-1 group-title="Sports, Live" tvg-logo="http://x/a b.png",Match Day
http://match
"#;
    let channels = parse_m3u(content).channels;
    assert_eq!(channels[0].category, "Sports, Live");
    assert_eq!(channels[0].logo, "http://x/a b.png");
    assert_eq!(channels[0].name, "Match Day");
}

#[test]
fn test_parse_malformed_stray_quotes() {
    let content = r#"#EXTM3U
#EXTINF:0 tvg-logo="https://example.com/logo.png" "tvg-id="SRF1.ch" group-title="Deutsch", SRF 1 FHD
udp://@233.50.230.1:5000
"#;
    let channels = parse_m3u(content).channels;
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].name, "SRF 1 FHD");
    assert_eq!(channels[0].logo, "https://example.com/logo.png");
    assert_eq!(channels[0].id.as_deref(), Some("SRF1.ch"));
    assert_eq!(channels[0].category, "Deutsch");
    assert_eq!(channels[0].link, "udp://@233.50.230.1:5000");
}

#[test]
fn test_user_agent_and_http_options() {
    let content = r#"#EXTM3U
#EXTINF:-1 group-title="Live",Toffee Sports
#EXTVLCOPT:http-user-agent=Toffee (Linux;Android 14)
#EXTHTTP:{"cookie":"Edge-Cache-Cookie=abc","headers":{"Referer":"https://toffee"}}
https://toffee/sports.m3u8
"#;
    let outcome = parse_m3u(content);
    assert!(outcome.warnings.is_empty());
    let ch = &outcome.channels[0];
    assert_eq!(ch.user_agent.as_deref(), Some("Toffee (Linux;Android 14)"));
    assert_eq!(ch.cookie.as_deref(), Some("Edge-Cache-Cookie=abc"));
    assert_eq!(ch.headers.get("Referer").map(String::as_str), Some("https://toffee"));
}

#[test]
fn test_invalid_http_options_keep_channel() {
    let content = r#"#EXTINF:-1 group-title="Live",Broken Headers
#EXTHTTP:{cookie: not json
http://broken
"#;
    let outcome = parse_m3u(content);
    assert_eq!(outcome.channels.len(), 1);
    assert_eq!(outcome.channels[0].name, "Broken Headers");
    assert_eq!(outcome.channels[0].cookie, None);
    assert!(outcome.channels[0].headers.is_empty());
    assert_eq!(outcome.warnings, vec![ParseWarning::InvalidHttpOptions { line: 2 }]);
}

#[test]
fn test_link_only_records_are_dropped() {
    let content = "#EXTM3U\nhttp://orphan\n#EXTINF:-1,Real\nhttp://real\nhttp://second-orphan\n";
    let outcome = parse_m3u(content);
    assert_eq!(outcome.channels.len(), 1);
    assert_eq!(outcome.channels[0].name, "Real");
    assert_eq!(
        outcome.warnings,
        vec![ParseWarning::OrphanLink { line: 2 }, ParseWarning::OrphanLink { line: 5 }]
    );
}

#[test]
fn test_state_resets_after_each_record() {
    let content = r#"#EXTINF:-1 group-title="A",First
#EXTVLCOPT:http-user-agent=UA-1
http://first
#EXTINF:-1,Second
http://second
"#;
    let channels = parse_m3u(content).channels;
    assert_eq!(channels[0].user_agent.as_deref(), Some("UA-1"));
    assert_eq!(channels[1].user_agent, None);
    assert_eq!(channels[1].category, UNCATEGORIZED);
}

#[test]
fn test_crlf_line_endings() {
    let content = "#EXTM3U\r\n#EXTINF:-1 group-title=\"News\",CRLF News\r\nhttp://crlf\r\n";
    let channels = parse_m3u(content).channels;
    assert_eq!(channels[0].name, "CRLF News");
    assert_eq!(channels[0].link, "http://crlf");
}

#[test]
fn test_no_empty_names_or_links() {
    let content = "#EXTINF:-1,\n\n   \nhttp://a\n#EXTINF:-1 ,  \nhttp://b\nhttp://c\n#EXTINF:-1,Dangling\n";
    let outcome = parse_m3u(content);
    assert_eq!(outcome.channels.len(), 2);
    assert!(outcome.channels.iter().all(|c| c.is_playable()));
}

#[test]
fn test_parse_is_deterministic() {
    let content = r#"#EXTINF:-1 group-title="News",A
http://a
#EXTHTTP:{"cookie":"c"}
#EXTINF:-1,B
http://b
"#;
    assert_eq!(parse_m3u(content), parse_m3u(content));
}

#[test]
fn test_blank_group_and_logo_use_defaults() {
    let content = "#EXTINF:-1 tvg-logo=\"\" group-title=\" \",Empty Attrs\nhttp://stream/e.m3u8\n";
    let channels = parse_m3u(content).channels;
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].category, UNCATEGORIZED);
    assert_eq!(channels[0].logo, PLACEHOLDER_LOGO);
}
