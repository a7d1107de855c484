use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        functions::{
            ChatMessage, ChatRole, CheckoutRequest, CheckoutResponse, DraftLineItem,
            GenerateEmailRequest, GenerateInvoiceRequest, GenerateInvoiceResponse,
            GeneratedEmail, InvoiceDraft, SendInvoiceRequest, SendInvoiceResponse,
            SupportChatRequest, SupportChatResponse, WebhookAck,
        },
        invoices::{
            CreateInvoiceItem, CreateInvoiceRequest, InvoiceDeleted, InvoiceList,
            InvoiceSummary, InvoiceWithItems, PaymentList, UpdateInvoiceRequest,
        },
        leads::CreateLeadRequest,
        profiles::UpdateProfileRequest,
        public::{PublicInvoice, PublicInvoiceItem},
    },
    models::{Invoice, InvoiceItem, InvoiceStatus, Lead, Payment, PaymentStatus, Profile},
    response::{ApiResponse, Meta},
    routes::{functions, health, invoices, leads, profile, public},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Whitmore Payments API", description = "Invoices, public pay links and payment callbacks"),
    paths(
        health::health_check,
        invoices::list_invoices,
        invoices::create_invoice,
        invoices::invoice_summary,
        invoices::get_invoice,
        invoices::update_invoice,
        invoices::delete_invoice,
        invoices::list_payments,
        invoices::generate_invoice,
        public::get_public_invoice,
        functions::create_checkout,
        functions::stripe_webhook,
        functions::send_invoice,
        functions::ai_generate_email,
        functions::ai_support_chat,
        leads::create_lead,
        profile::get_profile,
        profile::update_profile
    ),
    components(
        schemas(
            Invoice,
            InvoiceItem,
            InvoiceStatus,
            Payment,
            PaymentStatus,
            Lead,
            Profile,
            CreateInvoiceRequest,
            CreateInvoiceItem,
            UpdateInvoiceRequest,
            InvoiceWithItems,
            InvoiceList,
            InvoiceSummary,
            InvoiceDeleted,
            PaymentList,
            PublicInvoice,
            PublicInvoiceItem,
            CheckoutRequest,
            CheckoutResponse,
            WebhookAck,
            SendInvoiceRequest,
            SendInvoiceResponse,
            GenerateEmailRequest,
            GeneratedEmail,
            ChatRole,
            ChatMessage,
            SupportChatRequest,
            SupportChatResponse,
            GenerateInvoiceRequest,
            GenerateInvoiceResponse,
            InvoiceDraft,
            DraftLineItem,
            CreateLeadRequest,
            UpdateProfileRequest,
            health::HealthData,
            Meta,
            ApiResponse<InvoiceWithItems>,
            ApiResponse<InvoiceList>,
            ApiResponse<PublicInvoice>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Invoices", description = "Owner invoice endpoints"),
        (name = "Public", description = "Token-addressed pay page endpoints"),
        (name = "Functions", description = "Checkout, webhook, email and assistant endpoints"),
        (name = "Leads", description = "Trial sign-up endpoints"),
        (name = "Profile", description = "Business profile endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
