//! JSON contract of the remote scheduling service.

use serde::{Deserialize, Serialize};

use super::{
    company::{ClientUpsert, ProviderUpsert},
    grant::Redemption,
};

/// Body of `GET /solicitacao-token/validar/{token}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenValidation {
    #[serde(default)]
    pub email_cliente: Option<String>,
    pub empresa_contratante: RemoteCompany,
    pub contrato_cliente: RemoteContract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCompany {
    pub cnpj: String,
    pub razao_social: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteContract {
    pub id: i64,
    pub cli_fornec: RemoteClient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteClient {
    pub cnpj: String,
    pub razao_social: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
}

impl TokenValidation {
    /// Local writes for this validation. The provider's system URL is the
    /// scheduling service the token came from.
    pub fn into_redemption(self, profile_id: i64, token: &str, system_url: &str) -> Redemption {
        let client_email = self.email_cliente.unwrap_or_default();
        let remote_client = self.contrato_cliente.cli_fornec;
        Redemption {
            profile_id,
            token: token.to_string(),
            provider: ProviderUpsert {
                tax_id: self.empresa_contratante.cnpj,
                name: self.empresa_contratante.razao_social,
                email: client_email.clone(),
                system_url: system_url.to_string(),
            },
            client: ClientUpsert {
                tax_id: remote_client.cnpj,
                name: remote_client.razao_social,
                email: remote_client.email.unwrap_or_default(),
                phone: remote_client.telefone.unwrap_or_default(),
            },
            client_email,
            contract_id: self.contrato_cliente.id,
        }
    }
}

/// Body of `POST /solicitacoes/criar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSubmission {
    pub tipo_profissional: String,
    pub jornada: String,
    pub observacoes: String,
    pub usuario_solicitante_id: i64,
    pub cli_fornec_id: i64,
    pub empresa_contratante_id: i64,
    pub contrato_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_body_parses_and_maps_to_redemption() {
        let body = r#"{
            "emailCliente": "c@x.com",
            "empresaContratante": {"cnpj": "111", "razaoSocial": "ProvCo"},
            "contratoCliente": {
                "id": 7,
                "cliFornec": {"cnpj": "222", "razaoSocial": "ClientCo", "email": "c@x.com", "telefone": "555"}
            }
        }"#;
        let validation: TokenValidation = serde_json::from_str(body).unwrap();
        let redemption = validation.into_redemption(3, "abc123", "http://escala.local/");

        assert_eq!(redemption.profile_id, 3);
        assert_eq!(redemption.token, "abc123");
        assert_eq!(redemption.contract_id, 7);
        assert_eq!(redemption.provider.tax_id, "111");
        assert_eq!(redemption.provider.name, "ProvCo");
        assert_eq!(redemption.provider.email, "c@x.com");
        assert_eq!(redemption.provider.system_url, "http://escala.local/");
        assert_eq!(redemption.client.tax_id, "222");
        assert_eq!(redemption.client.phone, "555");
    }

    #[test]
    fn test_optional_contact_fields_default_to_empty() {
        let body = r#"{
            "empresaContratante": {"cnpj": "111", "razaoSocial": "ProvCo"},
            "contratoCliente": {"id": 1, "cliFornec": {"cnpj": "222", "razaoSocial": "ClientCo"}}
        }"#;
        let validation: TokenValidation = serde_json::from_str(body).unwrap();
        let redemption = validation.into_redemption(1, "t", "http://escala.local/");

        assert_eq!(redemption.client_email, "");
        assert_eq!(redemption.client.email, "");
        assert_eq!(redemption.client.phone, "");
    }

    #[test]
    fn test_submission_uses_camel_case_keys() {
        let submission = RequestSubmission {
            tipo_profissional: "Enfermeiro".into(),
            jornada: "12x36".into(),
            observacoes: String::new(),
            usuario_solicitante_id: 1,
            cli_fornec_id: 2,
            empresa_contratante_id: 3,
            contrato_id: 7,
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["tipoProfissional"], "Enfermeiro");
        assert_eq!(json["cliFornecId"], 2);
        assert_eq!(json["empresaContratanteId"], 3);
        assert_eq!(json["contratoId"], 7);
    }
}
