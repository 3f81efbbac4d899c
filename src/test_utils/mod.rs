#![allow(missing_docs)]

pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_input_with_value,
    assert_form_submit_button_with_text, assert_hx_endpoint, assert_radio_group, must_get_form,
};
pub(crate) use html::{
    alert_text, assert_valid_html, attr_of, parse_html_document, parse_html_fragment, text_of,
};
pub(crate) use http::{assert_content_type, assert_hx_redirect, assert_status_ok};
