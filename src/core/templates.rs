//! HTML templates for the views, rendered with Handlebars. Values are
//! HTML-escaped by default; only already-rendered markdown goes through
//! the triple-stash `{{{html}}}` form.

use std::fmt;

use handlebars::Handlebars;

#[derive(Debug)]
pub enum Template {
    Transcript,
    Sidebar,
    AuthCard,
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const TRANSCRIPT_TEMPLATE: &str = r#"<div id="messages">
{{#each messages}}
<div class="message {{sender}}-message{{#if is_error}} error{{/if}}">
  <div class="message-bubble"><div class="message-content">{{{html}}}</div></div>
  <div class="message-timestamp">{{time}}</div>
</div>
{{/each}}
{{#if loading}}
<div class="message bot-message typing-indicator">
  <div class="message-content">
    <div class="typing-dot"></div><div class="typing-dot"></div><div class="typing-dot"></div>
  </div>
</div>
{{/if}}
</div>
"#;

const SIDEBAR_TEMPLATE: &str = r#"<div id="chatList">
{{#if sessions}}
{{#each sessions}}
<div class="chat-item{{#if active}} active{{/if}}" data-chat-id="{{id}}">
  <div class="chat-icon"><i class="fas fa-comment"></i></div>
  <div class="chat-info">
    {{#if editing}}
    <input type="text" class="chat-title-input" maxlength="50" value="{{title}}">
    {{else}}
    <div class="chat-title" data-chat-id="{{id}}">{{title}}</div>
    {{/if}}
    <div class="chat-date">{{date}}</div>
  </div>
  <div class="chat-actions">
    <button class="edit-chat-btn" title="Edit Chat Name" data-action="rename" data-chat-id="{{id}}"><i class="fas fa-edit"></i></button>
    <button class="delete-chat-btn" title="Delete Chat" data-action="delete" data-chat-id="{{id}}"><i class="fas fa-trash"></i></button>
  </div>
</div>
{{/each}}
{{else}}
<div class="chat-item empty">
  <div class="chat-icon"><i class="fas fa-comments"></i></div>
  <div class="chat-title">No chats yet</div>
</div>
{{/if}}
</div>
"#;

const AUTH_CARD_TEMPLATE: &str = r##"<div class="auth-card">
<h2 id="auth-title">{{title}}</h2>
{{#if banner}}
<div class="auth-error alert alert-danger">{{banner}}</div>
{{/if}}
{{#if sign_in}}
<form id="signin-form">
  <input type="email" id="signin-email" placeholder="Email" required>
  <input type="password" id="signin-password" placeholder="Password" required>
  <button type="submit">Sign In</button>
  <a href="#" id="show-signup">Create an account</a>
</form>
{{else}}
<form id="signup-form">
  <input type="text" id="signup-username" placeholder="Username" required>
  <input type="email" id="signup-email" placeholder="Email" required>
  <input type="password" id="signup-password" placeholder="Password" required>
  <input type="password" id="signup-confirm" placeholder="Confirm password" required>
  <button type="submit">Sign Up</button>
  <a href="#" id="show-signin">Already have an account?</a>
</form>
{{/if}}
</div>
"##;

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry
        .register_template_string(&Template::Transcript.to_string(), TRANSCRIPT_TEMPLATE)
        .expect("Failed to register template");
    registry
        .register_template_string(&Template::Sidebar.to_string(), SIDEBAR_TEMPLATE)
        .expect("Failed to register template");
    registry
        .register_template_string(&Template::AuthCard.to_string(), AUTH_CARD_TEMPLATE)
        .expect("Failed to register template");
    registry
}
