use changereq_core::config::{FieldConfig, FormConfig};
use changereq_core::ChangeRequestRecord;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    PlainTextInput {
        action_id: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        multiline: bool,
    },
}

impl InputElement {
    pub fn single_line(action_id: impl Into<String>) -> Self {
        Self::PlainTextInput { action_id: action_id.into(), multiline: false }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Input { block_id: String, element: InputElement, label: TextObject, optional: bool },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalView {
    #[serde(rename = "type")]
    pub view_type: &'static str,
    pub callback_id: String,
    pub title: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<TextObject>,
    pub blocks: Vec<Block>,
}

pub struct ModalBuilder {
    callback_id: String,
    title: String,
    submit: Option<String>,
    blocks: Vec<Block>,
}

impl ModalBuilder {
    pub fn new(callback_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { callback_id: callback_id.into(), title: title.into(), submit: None, blocks: Vec::new() }
    }

    pub fn submit(mut self, label: impl Into<String>) -> Self {
        self.submit = Some(label.into());
        self
    }

    pub fn required_text_input(mut self, field: &FieldConfig) -> Self {
        self.blocks.push(Block::Input {
            block_id: field.block_id.clone(),
            element: InputElement::single_line(field.action_id.clone()),
            label: TextObject::plain(field.label.clone()),
            optional: false,
        });
        self
    }

    pub fn build(self) -> ModalView {
        ModalView {
            view_type: "modal",
            callback_id: self.callback_id,
            title: TextObject::plain(self.title),
            submit: self.submit.map(TextObject::plain),
            blocks: self.blocks,
        }
    }
}

/// The form opened by the slash command: three required single-line inputs.
pub fn change_request_modal(form: &FormConfig) -> ModalView {
    ModalBuilder::new(form.callback_id.clone(), form.title.clone())
        .submit(form.submit_label.clone())
        .required_text_input(&form.company)
        .required_text_input(&form.license_type)
        .required_text_input(&form.quantity)
        .build()
}

pub fn change_request_notification(record: &ChangeRequestRecord) -> String {
    format!(
        "*New Change Request:*\n*CORID:* {}\n*Company:* {}\n*License:* {}\n*Quantity:* {}",
        record.id, record.company_name, record.license_type, record.quantity
    )
}
