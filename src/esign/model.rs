//! Wire models for the envelope, recipient-view, and template endpoints.

// self
use crate::_prelude::*;

/// Envelope created from a server-side template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDefinition {
	/// Template the envelope is instantiated from.
	pub template_id: String,
	/// Role assignments filling the template's placeholders.
	pub template_roles: Vec<TemplateRole>,
	/// `sent` dispatches immediately, `created` keeps a draft.
	pub status: String,
}

/// Recipient bound to one template role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRole {
	/// Recipient email.
	pub email: String,
	/// Recipient display name.
	pub name: String,
	/// Template role name.
	pub role_name: String,
	/// Marks the recipient as embedded; the same value must be repeated in the view request.
	pub client_user_id: String,
	/// Prefilled tab values.
	pub tabs: Tabs,
}

/// Tab collections attached to a role.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tabs {
	/// Free-text tabs.
	#[serde(default)]
	pub text_tabs: Vec<TextTab>,
}

/// Prefilled free-text tab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextTab {
	/// Label matching the tab declared on the template.
	pub tab_label: String,
	/// Value shown to the signer.
	pub value: String,
}

/// Response of the envelope creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeSummary {
	/// Identifier of the new envelope.
	pub envelope_id: String,
	/// Envelope status.
	#[serde(default)]
	pub status: Option<String>,
	/// Relative URI of the envelope resource.
	#[serde(default)]
	pub uri: Option<String>,
}

/// Request for an embedded signing ceremony URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientViewRequest {
	/// Where the provider sends the browser after signing.
	pub return_url: String,
	/// How the application authenticated the signer.
	pub authentication_method: String,
	/// Recipient email.
	pub email: String,
	/// Recipient display name.
	pub user_name: String,
	/// Embedded recipient identifier used when creating the envelope.
	pub client_user_id: String,
}

/// Response carrying the signing ceremony URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewUrl {
	/// Single-use signing URL.
	pub url: String,
}

/// Template metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeTemplate {
	/// Template identifier.
	#[serde(default)]
	pub template_id: Option<String>,
	/// Template name.
	#[serde(default)]
	pub name: Option<String>,
	/// Documents in signing order.
	#[serde(default)]
	pub documents: Vec<TemplateDocument>,
	/// Recipient placeholders.
	#[serde(default)]
	pub recipients: Option<Recipients>,
}

/// Document attached to a template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDocument {
	/// Document identifier.
	#[serde(default)]
	pub document_id: Option<String>,
	/// Document name.
	#[serde(default)]
	pub name: Option<String>,
	/// Position within the template, as a decimal string.
	#[serde(default)]
	pub order: Option<String>,
	/// Relative URI of the document resource.
	#[serde(default)]
	pub uri: Option<String>,
}

/// Recipient groups of a template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipients {
	/// Signer placeholders.
	#[serde(default)]
	pub signers: Vec<Signer>,
}

/// Signer placeholder of a template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
	/// Template role name.
	#[serde(default)]
	pub role_name: Option<String>,
	/// Preassigned email, if any.
	#[serde(default)]
	pub email: Option<String>,
	/// Preassigned name, if any.
	#[serde(default)]
	pub name: Option<String>,
}

/// Error payload returned by the REST API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorDetails {
	/// Machine-readable error code.
	#[serde(default)]
	pub error_code: Option<String>,
	/// Human-readable message.
	#[serde(default)]
	pub message: Option<String>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn envelope_serializes_in_camel_case() {
		let envelope = EnvelopeDefinition {
			template_id: "tpl".into(),
			template_roles: vec![TemplateRole {
				email: "a@example.com".into(),
				name: "Ada".into(),
				role_name: "Applicant".into(),
				client_user_id: "cid".into(),
				tabs: Tabs {
					text_tabs: vec![TextTab { tab_label: "Company-Name".into(), value: "Acme".into() }],
				},
			}],
			status: "sent".into(),
		};
		let value = serde_json::to_value(&envelope).expect("Envelope should serialize.");

		assert_eq!(value["templateId"], "tpl");
		assert_eq!(value["templateRoles"][0]["roleName"], "Applicant");
		assert_eq!(value["templateRoles"][0]["clientUserId"], "cid");
		assert_eq!(value["templateRoles"][0]["tabs"]["textTabs"][0]["tabLabel"], "Company-Name");
	}

	#[test]
	fn sparse_templates_deserialize() {
		let template: EnvelopeTemplate =
			serde_json::from_str("{\"templateId\":\"tpl\"}").expect("Sparse template should parse.");

		assert!(template.documents.is_empty());
		assert!(template.recipients.is_none());
	}
}
