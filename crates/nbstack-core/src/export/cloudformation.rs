// ABOUTME: Synthesizes a StackDefinition into a CloudFormation template and renders it as JSON.
// ABOUTME: Emits the function, its execution role, the front door revision, permissions and URL outputs.

use serde_json::{Value, json};

use crate::compute::ComputeDescriptor;
use crate::front_door::{AuthorizerDescriptor, CorsPolicy, CustomDomain, FrontDoorRevision};
use crate::stack::StackDefinition;
use crate::template::{Output, Parameter, Resource, Template, get_att, reference, sub};

pub const IMAGE_URI_PARAMETER: &str = "NbconvertImageUri";

pub const FUNCTION_ROLE: &str = "NbconvertFunctionRole";
pub const FUNCTION: &str = "NbconvertFunction";

pub const FUNCTION_URL: &str = "NbconvertFunctionUrl";
pub const FUNCTION_URL_PERMISSION: &str = "NbconvertFunctionUrlPermission";
pub const FUNCTION_URL_INVOKE_PERMISSION: &str = "NbconvertFunctionUrlInvokePermission";

pub const REST_API: &str = "NbconvertRestApi";
pub const REST_RESOURCE: &str = "NbconvertRestResource";
pub const REST_GET_METHOD: &str = "NbconvertRestGetMethod";
pub const REST_DEPLOYMENT: &str = "NbconvertRestDeployment";
pub const REST_STAGE: &str = "NbconvertRestStage";
pub const REST_DOMAIN: &str = "NbconvertRestDomain";
pub const REST_BASE_PATH_MAPPING: &str = "NbconvertRestBasePathMapping";
pub const REST_INVOKE_PERMISSION: &str = "NbconvertRestInvokePermission";

pub const HTTP_API: &str = "NbconvertHttpApi";
pub const HTTP_INTEGRATION: &str = "NbconvertHttpIntegration";
pub const HTTP_AUTHORIZER: &str = "NbconvertJwtAuthorizer";
pub const HTTP_ROUTE: &str = "NbconvertHttpRoute";
pub const HTTP_STAGE: &str = "NbconvertHttpStage";
pub const HTTP_DOMAIN: &str = "NbconvertHttpDomain";
pub const HTTP_API_MAPPING: &str = "NbconvertHttpApiMapping";
pub const HTTP_INVOKE_PERMISSION: &str = "NbconvertHttpInvokePermission";

/// Stage name used by the REST API deployment.
pub const REST_STAGE_NAME: &str = "prod";
const POLICY_VERSION: &str = "2012-10-17";
const BASIC_EXECUTION_POLICY: &str =
    "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Build the CloudFormation template for a stack.
///
/// Construction order follows the stack's control flow: compute resource,
/// front door, permissions, outputs.
pub fn synthesize(stack: &StackDefinition) -> Template {
    let mut template = Template::new(format!(
        "nbconvert function behind a {} front door ({} environment)",
        stack.revision(),
        stack.environment
    ));

    template.add_parameter(
        IMAGE_URI_PARAMETER,
        Parameter::string(format!(
            "URI of the nbconvert container image built from {}",
            stack.compute.image_directory.display()
        )),
    );

    add_compute(&mut template, &stack.compute);

    let api_name = format!("{}-nbconvert-api", stack.environment);
    let front_door = &stack.front_door;
    match front_door.revision {
        FrontDoorRevision::FunctionUrl => add_function_url(&mut template),
        FrontDoorRevision::RestApi => {
            add_rest_api(&mut template, &api_name, &front_door.base_path)
        }
        FrontDoorRevision::HttpApi => add_http_api(
            &mut template,
            &api_name,
            &front_door.route_key(),
            &front_door.base_path,
            front_door.cors.as_ref(),
            front_door.authorizer.as_ref(),
        ),
    }

    if let Some(domain) = &front_door.custom_domain {
        add_custom_domain(&mut template, front_door.revision, domain);
    }

    tracing::debug!(
        "synthesized {} resources for {}",
        template.resources.len(),
        stack.stack_name
    );

    template
}

/// Render a template as pretty-printed JSON.
pub fn export_json(template: &Template) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(template)?;
    json.push('\n');
    Ok(json)
}

fn add_compute(template: &mut Template, compute: &ComputeDescriptor) {
    template.add_resource(
        FUNCTION_ROLE,
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": "lambda.amazonaws.com" },
                        "Action": "sts:AssumeRole",
                    }],
                },
                "ManagedPolicyArns": [sub(BASIC_EXECUTION_POLICY)],
            }),
        ),
    );

    let mut properties = json!({
        "FunctionName": compute.name,
        "PackageType": "Image",
        "Code": { "ImageUri": reference(IMAGE_URI_PARAMETER) },
        "Role": get_att(FUNCTION_ROLE, "Arn"),
        "Timeout": compute.timeout_seconds(),
    });
    if let (Some(architecture), Value::Object(map)) = (compute.architecture, &mut properties) {
        map.insert("Architectures".to_string(), json!([architecture.as_str()]));
    }

    template.add_resource(FUNCTION, Resource::new("AWS::Lambda::Function", properties));
}

fn add_function_url(template: &mut Template) {
    template.add_resource(
        FUNCTION_URL,
        Resource::new(
            "AWS::Lambda::Url",
            json!({
                "AuthType": "NONE",
                "TargetFunctionArn": get_att(FUNCTION, "Arn"),
            }),
        ),
    );

    template.add_resource(
        FUNCTION_URL_PERMISSION,
        Resource::new(
            "AWS::Lambda::Permission",
            json!({
                "Action": "lambda:InvokeFunctionUrl",
                "FunctionName": get_att(FUNCTION, "Arn"),
                "Principal": "*",
                "FunctionUrlAuthType": "NONE",
            }),
        ),
    );

    // Public URLs also need lambda:InvokeFunction scoped to URL invocations
    template.add_resource(
        FUNCTION_URL_INVOKE_PERMISSION,
        Resource::new(
            "AWS::Lambda::Permission",
            json!({
                "Action": "lambda:InvokeFunction",
                "FunctionName": get_att(FUNCTION, "Arn"),
                "Principal": "*",
                "InvokedViaFunctionUrl": true,
            }),
        ),
    );

    template.add_output(
        "FunctionUrl",
        Output::new(
            "Public URL of the nbconvert function",
            get_att(FUNCTION_URL, "FunctionUrl"),
        ),
    );
}

fn add_rest_api(template: &mut Template, api_name: &str, base_path: &str) {
    template.add_resource(
        REST_API,
        Resource::new(
            "AWS::ApiGateway::RestApi",
            json!({
                "Name": api_name,
                "EndpointConfiguration": { "Types": ["REGIONAL"] },
                "Policy": {
                    "Version": POLICY_VERSION,
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": "*",
                        "Action": "execute-api:Invoke",
                        "Resource": "execute-api:/*",
                    }],
                },
            }),
        ),
    );

    template.add_resource(
        REST_RESOURCE,
        Resource::new(
            "AWS::ApiGateway::Resource",
            json!({
                "RestApiId": reference(REST_API),
                "ParentId": get_att(REST_API, "RootResourceId"),
                "PathPart": base_path,
            }),
        ),
    );

    template.add_resource(
        REST_GET_METHOD,
        Resource::new(
            "AWS::ApiGateway::Method",
            json!({
                "RestApiId": reference(REST_API),
                "ResourceId": reference(REST_RESOURCE),
                "HttpMethod": "GET",
                "AuthorizationType": "NONE",
                "Integration": {
                    "Type": "AWS_PROXY",
                    "IntegrationHttpMethod": "POST",
                    "Uri": sub(format!(
                        "arn:${{AWS::Partition}}:apigateway:${{AWS::Region}}:lambda:path/2015-03-31/functions/${{{}.Arn}}/invocations",
                        FUNCTION
                    )),
                },
            }),
        ),
    );

    template.add_resource(
        REST_DEPLOYMENT,
        Resource::new(
            "AWS::ApiGateway::Deployment",
            json!({ "RestApiId": reference(REST_API) }),
        )
        .depends_on(REST_GET_METHOD),
    );

    template.add_resource(
        REST_STAGE,
        Resource::new(
            "AWS::ApiGateway::Stage",
            json!({
                "RestApiId": reference(REST_API),
                "DeploymentId": reference(REST_DEPLOYMENT),
                "StageName": REST_STAGE_NAME,
            }),
        ),
    );

    add_invoke_permission(
        template,
        REST_INVOKE_PERMISSION,
        &format!(
            "arn:${{AWS::Partition}}:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{{}}}/*/GET/{}",
            REST_API, base_path
        ),
    );

    template.add_output(
        "RestApiUrl",
        Output::new(
            "Invoke URL of the nbconvert REST API stage",
            sub(format!(
                "https://${{{}}}.execute-api.${{AWS::Region}}.${{AWS::URLSuffix}}/${{{}}}/",
                REST_API, REST_STAGE
            )),
        ),
    );
}

fn add_http_api(
    template: &mut Template,
    api_name: &str,
    route_key: &str,
    base_path: &str,
    cors: Option<&CorsPolicy>,
    authorizer: Option<&AuthorizerDescriptor>,
) {
    let mut api = json!({
        "Name": api_name,
        "ProtocolType": "HTTP",
    });
    if let (Some(cors), Value::Object(map)) = (cors, &mut api) {
        map.insert(
            "CorsConfiguration".to_string(),
            json!({
                "AllowOrigins": cors.allow_origins,
                "AllowMethods": cors.allow_methods,
                "AllowHeaders": cors.allow_headers,
            }),
        );
    }
    template.add_resource(HTTP_API, Resource::new("AWS::ApiGatewayV2::Api", api));

    template.add_resource(
        HTTP_INTEGRATION,
        Resource::new(
            "AWS::ApiGatewayV2::Integration",
            json!({
                "ApiId": reference(HTTP_API),
                "IntegrationType": "AWS_PROXY",
                "IntegrationUri": get_att(FUNCTION, "Arn"),
                "PayloadFormatVersion": "2.0",
            }),
        ),
    );

    let mut route = json!({
        "ApiId": reference(HTTP_API),
        "RouteKey": route_key,
        "Target": sub(format!("integrations/${{{}}}", HTTP_INTEGRATION)),
        "AuthorizationType": "NONE",
    });

    if let Some(authorizer) = authorizer {
        template.add_resource(
            HTTP_AUTHORIZER,
            Resource::new(
                "AWS::ApiGatewayV2::Authorizer",
                json!({
                    "ApiId": reference(HTTP_API),
                    "AuthorizerType": "JWT",
                    "Name": authorizer.name,
                    "IdentitySource": [authorizer.identity_source],
                    "JwtConfiguration": {
                        "Issuer": authorizer.issuer,
                        "Audience": authorizer.audience,
                    },
                }),
            ),
        );
        route["AuthorizationType"] = json!("JWT");
        route["AuthorizerId"] = reference(HTTP_AUTHORIZER);
    }

    template.add_resource(HTTP_ROUTE, Resource::new("AWS::ApiGatewayV2::Route", route));

    template.add_resource(
        HTTP_STAGE,
        Resource::new(
            "AWS::ApiGatewayV2::Stage",
            json!({
                "ApiId": reference(HTTP_API),
                "StageName": "$default",
                "AutoDeploy": true,
            }),
        ),
    );

    add_invoke_permission(
        template,
        HTTP_INVOKE_PERMISSION,
        &format!(
            "arn:${{AWS::Partition}}:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{{}}}/*/*/{}",
            HTTP_API, base_path
        ),
    );

    template.add_output(
        "HttpApiUrl",
        Output::new(
            "Default endpoint of the nbconvert HTTP API",
            get_att(HTTP_API, "ApiEndpoint"),
        ),
    );
}

/// Grant API Gateway permission to invoke the function from `source_arn`.
fn add_invoke_permission(template: &mut Template, logical_id: &str, source_arn: &str) {
    template.add_resource(
        logical_id,
        Resource::new(
            "AWS::Lambda::Permission",
            json!({
                "Action": "lambda:InvokeFunction",
                "FunctionName": get_att(FUNCTION, "Arn"),
                "Principal": "apigateway.amazonaws.com",
                "SourceArn": sub(source_arn),
            }),
        ),
    );
}

fn add_custom_domain(template: &mut Template, revision: FrontDoorRevision, domain: &CustomDomain) {
    let domain_id = match revision {
        FrontDoorRevision::RestApi => {
            template.add_resource(
                REST_DOMAIN,
                Resource::new(
                    "AWS::ApiGateway::DomainName",
                    json!({
                        "DomainName": domain.domain_name,
                        "RegionalCertificateArn": domain.certificate_arn,
                        "EndpointConfiguration": { "Types": ["REGIONAL"] },
                        "SecurityPolicy": "TLS_1_2",
                    }),
                ),
            );
            template.add_resource(
                REST_BASE_PATH_MAPPING,
                Resource::new(
                    "AWS::ApiGateway::BasePathMapping",
                    json!({
                        "DomainName": reference(REST_DOMAIN),
                        "RestApiId": reference(REST_API),
                        "Stage": reference(REST_STAGE),
                    }),
                ),
            );
            REST_DOMAIN
        }
        FrontDoorRevision::HttpApi => {
            template.add_resource(
                HTTP_DOMAIN,
                Resource::new(
                    "AWS::ApiGatewayV2::DomainName",
                    json!({
                        "DomainName": domain.domain_name,
                        "DomainNameConfigurations": [{
                            "CertificateArn": domain.certificate_arn,
                            "EndpointType": "REGIONAL",
                            "SecurityPolicy": "TLS_1_2",
                        }],
                    }),
                ),
            );
            template.add_resource(
                HTTP_API_MAPPING,
                Resource::new(
                    "AWS::ApiGatewayV2::ApiMapping",
                    json!({
                        "ApiId": reference(HTTP_API),
                        "DomainName": reference(HTTP_DOMAIN),
                        "Stage": reference(HTTP_STAGE),
                    }),
                ),
            );
            HTTP_DOMAIN
        }
        FrontDoorRevision::FunctionUrl => return,
    };

    template.add_output(
        "CustomDomainUrl",
        Output::new(
            "URL of the nbconvert route on the custom domain",
            json!(domain.route_url()),
        ),
    );
    template.add_output(
        "CustomDomainTarget",
        Output::new(
            "Regional domain name the custom domain's DNS record must alias",
            get_att(domain_id, "RegionalDomainName"),
        ),
    );
}
