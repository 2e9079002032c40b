//! Request builders and template inspection for the embedded signing flow.

// self
use crate::{
	_prelude::*,
	auth::TemplateId,
	esign::model::{
		EnvelopeDefinition, EnvelopeTemplate, RecipientViewRequest, Tabs, TemplateRole, TextTab,
	},
};

/// Template role every applicant is assigned to.
pub const APPLICANT_ROLE: &str = "Applicant";
/// Template text tab receiving the applicant's company.
pub const COMPANY_TAB_LABEL: &str = "Company-Name";
/// Envelope status that dispatches the envelope immediately.
pub const STATUS_SENT: &str = "sent";
/// Authentication method reported for embedded signers.
pub const AUTHENTICATION_NONE: &str = "none";

/// Applicant details submitted through the signing form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
	/// Signer display name.
	pub name: String,
	/// Signer email.
	pub email: String,
	/// Company written into the template's company tab.
	#[serde(default)]
	pub company: String,
}
impl Applicant {
	/// Returns a description of the first missing field, if any.
	pub fn missing_field(&self) -> Option<&'static str> {
		if self.name.trim().is_empty() {
			Some("name")
		} else if self.email.trim().is_empty() {
			Some("email")
		} else {
			None
		}
	}
}

/// Builds an envelope assigning `applicant` to the applicant role of `template_id`.
pub fn make_envelope(
	template_id: &TemplateId,
	applicant: &Applicant,
	client_user_id: &str,
) -> EnvelopeDefinition {
	EnvelopeDefinition {
		template_id: template_id.to_string(),
		template_roles: vec![TemplateRole {
			email: applicant.email.clone(),
			name: applicant.name.clone(),
			role_name: APPLICANT_ROLE.into(),
			client_user_id: client_user_id.into(),
			tabs: Tabs {
				text_tabs: vec![TextTab {
					tab_label: COMPANY_TAB_LABEL.into(),
					value: applicant.company.clone(),
				}],
			},
		}],
		status: STATUS_SENT.into(),
	}
}

/// Builds the recipient-view request for an embedded applicant.
pub fn make_recipient_view_request(
	return_url: &Url,
	applicant: &Applicant,
	client_user_id: &str,
) -> RecipientViewRequest {
	RecipientViewRequest {
		return_url: return_url.to_string(),
		authentication_method: AUTHENTICATION_NONE.into(),
		email: applicant.email.clone(),
		user_name: applicant.name.clone(),
		client_user_id: client_user_id.into(),
	}
}

/// Path of the template's first document, or `""`.
pub fn first_document_path(template: &EnvelopeTemplate) -> &str {
	template
		.documents
		.iter()
		.find(|doc| doc.order.as_deref() == Some("1"))
		.and_then(|doc| doc.uri.as_deref())
		.unwrap_or_default()
}

/// Signing URL for the template's applicant, or `""` when the role has no email.
pub fn applicant_signing_url(template: &EnvelopeTemplate, signing_base: &str) -> String {
	template
		.recipients
		.iter()
		.flat_map(|recipients| recipients.signers.iter())
		.find(|signer| signer.role_name.as_deref() == Some(APPLICANT_ROLE))
		.and_then(|signer| signer.email.as_deref())
		.filter(|email| !email.is_empty())
		.map(|email| format!("{signing_base}?ti={email}"))
		.unwrap_or_default()
}

/// Redirect target for the template details route: signing URL followed by document path.
pub fn signing_target(template: &EnvelopeTemplate, signing_base: &str) -> String {
	let mut target = applicant_signing_url(template, signing_base);

	target.push_str(first_document_path(template));

	target
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::esign::model::{Recipients, Signer, TemplateDocument};

	const BASE: &str = "https://demo.example.net/Signing/";

	fn applicant() -> Applicant {
		Applicant { name: "Ada".into(), email: "ada@example.com".into(), company: "Acme".into() }
	}

	fn template(signer_email: Option<&str>, role: &str) -> EnvelopeTemplate {
		EnvelopeTemplate {
			documents: vec![
				TemplateDocument {
					order: Some("2".into()),
					uri: Some("/documents/2".into()),
					..Default::default()
				},
				TemplateDocument {
					order: Some("1".into()),
					uri: Some("/documents/1".into()),
					..Default::default()
				},
			],
			recipients: Some(Recipients {
				signers: vec![Signer {
					role_name: Some(role.into()),
					email: signer_email.map(Into::into),
					name: None,
				}],
			}),
			..Default::default()
		}
	}

	#[test]
	fn envelope_assigns_applicant_role_and_company_tab() {
		let template_id = TemplateId::new("tpl-1").expect("Template fixture should be valid.");
		let envelope = make_envelope(&template_id, &applicant(), "client-1");
		let role = &envelope.template_roles[0];

		assert_eq!(envelope.template_id, "tpl-1");
		assert_eq!(envelope.status, "sent");
		assert_eq!(role.role_name, "Applicant");
		assert_eq!(role.client_user_id, "client-1");
		assert_eq!(role.tabs.text_tabs[0].tab_label, "Company-Name");
		assert_eq!(role.tabs.text_tabs[0].value, "Acme");
	}

	#[test]
	fn recipient_view_repeats_client_user_id() {
		let return_url =
			Url::parse("http://localhost:4000/success").expect("Return URL fixture should parse.");
		let view = make_recipient_view_request(&return_url, &applicant(), "client-1");

		assert_eq!(view.return_url, "http://localhost:4000/success");
		assert_eq!(view.authentication_method, "none");
		assert_eq!(view.user_name, "Ada");
		assert_eq!(view.client_user_id, "client-1");
	}

	#[test]
	fn signing_target_joins_signing_url_and_document_path() {
		assert_eq!(
			signing_target(&template(Some("signer@example.com"), "Applicant"), BASE),
			"https://demo.example.net/Signing/?ti=signer@example.com/documents/1"
		);
	}

	#[test]
	fn missing_applicant_degrades_to_document_path() {
		assert_eq!(signing_target(&template(Some("x@example.com"), "Witness"), BASE), "/documents/1");
		assert_eq!(signing_target(&template(None, "Applicant"), BASE), "/documents/1");
		assert_eq!(signing_target(&EnvelopeTemplate::default(), BASE), "");
	}

	#[test]
	fn blank_fields_are_reported() {
		let mut form = applicant();

		assert_eq!(form.missing_field(), None);

		form.email = "  ".into();

		assert_eq!(form.missing_field(), Some("email"));
	}
}
